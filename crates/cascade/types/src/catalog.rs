use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::TypeId;

/// One valid status of a record type, with its display color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub name: String,
    pub color: String,
}

impl StateDescriptor {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Reference data describing one record type: stable id, display name, and
/// its ordered list of valid states.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub states: Vec<StateDescriptor>,
}

impl TypeDescriptor {
    pub fn new(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            states: Vec::new(),
        }
    }

    pub fn with_state(mut self, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.states.push(StateDescriptor::new(name, color));
        self
    }
}

/// The single canonical lookup between display names and stable type ids.
///
/// Rule documents observed in the wild carry a mix of both representations;
/// the catalog is where that ambiguity ends. Everything downstream compares
/// `TypeId`s only.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    by_id: HashMap<TypeId, TypeDescriptor>,
    name_to_id: HashMap<String, TypeId>,
}

impl TypeCatalog {
    pub fn from_descriptors(descriptors: Vec<TypeDescriptor>) -> Self {
        let mut by_id = HashMap::new();
        let mut name_to_id = HashMap::new();
        for descriptor in descriptors {
            name_to_id.insert(descriptor.name.clone(), descriptor.id.clone());
            by_id.insert(descriptor.id.clone(), descriptor);
        }
        Self { by_id, name_to_id }
    }

    pub fn descriptor(&self, id: &TypeId) -> Option<&TypeDescriptor> {
        self.by_id.get(id)
    }

    pub fn id_for_name(&self, name: &str) -> Option<&TypeId> {
        self.name_to_id.get(name)
    }

    pub fn name_for_id(&self, id: &TypeId) -> Option<&str> {
        self.by_id.get(id).map(|d| d.name.as_str())
    }

    /// Resolve either representation (a stable id or a display name) to
    /// the canonical `TypeId`. Ids win when a name collides with one.
    pub fn canonical_id(&self, name_or_id: &str) -> Option<&TypeId> {
        let as_id = TypeId::new(name_or_id);
        if let Some(descriptor) = self.by_id.get(&as_id) {
            return Some(&descriptor.id);
        }
        self.name_to_id.get(name_or_id)
    }

    /// Whether `status` is a valid state for the given type.
    pub fn is_valid_status(&self, id: &TypeId, status: &str) -> bool {
        self.by_id
            .get(id)
            .map(|d| d.states.iter().any(|s| s.name == status))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
