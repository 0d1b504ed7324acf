use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable numeric identifier of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identifier of a record type.
///
/// This is the canonical representation used throughout the engine. Display
/// names are resolved to a `TypeId` by the type catalog before any rule is
/// evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub String);

impl TypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an identity (a person or service account).
///
/// `descriptor` is the stable comparison key; `display_name` is
/// presentation-only and never participates in filter evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRef {
    pub descriptor: String,
    pub display_name: String,
}

impl IdentityRef {
    pub fn new(descriptor: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for IdentityRef {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
    }
}
impl Eq for IdentityRef {}

/// A single attribute value on a record.
///
/// Tag lists are carried as `Text` holding a `;`-delimited list under the
/// reserved `tags` field; the filter evaluator splits them on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Identity(IdentityRef),
}

impl AttrValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The value coerced to an integer, if it has one.
    ///
    /// Text values parse after trimming; booleans and identities do not
    /// coerce.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Read-only snapshot of a hierarchical record.
///
/// Snapshots are fetched fresh per evaluation; the engine never mutates one.
/// Status changes go through the record source collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub type_id: TypeId,
    pub status: String,
    pub title: String,
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub children: Vec<RecordId>,
}

impl Record {
    pub fn new(
        id: RecordId,
        type_id: TypeId,
        status: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            type_id,
            status: status.into(),
            title: title.into(),
            attributes: HashMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_parent(mut self, parent: RecordId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_child(mut self, child: RecordId) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute by field key.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }
}
