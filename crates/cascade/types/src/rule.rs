use serde::{Deserialize, Serialize};

use crate::record::TypeId;

/// Reserved field key that switches filter evaluation to tag-list semantics.
pub const TAGS_FIELD: &str = "tags";

/// Stable identifier of a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comparison operator of a filter item.
///
/// Ordering operators are only meaningful for integer values; identity and
/// tag comparisons support `Eq`/`Ne` only. Unsupported combinations resolve
/// to "not matched" at evaluation time, never an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Typed comparison value of a filter item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    PlainText(String),
    Integer(i64),
    Boolean(bool),
    /// Stable identity descriptor, compared against `IdentityRef::descriptor`.
    Identity(String),
}

/// One attribute comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterItem {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// One OR-branch of a rule's applicability condition.
///
/// Record-scoped filters run against the triggering record's attributes,
/// parent-scoped filters against the parent's. All filters within a scope
/// must match; both scopes must pass for the group to pass. An empty filter
/// list passes vacuously.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    pub name: String,
    #[serde(default)]
    pub record_filters: Vec<FilterItem>,
    #[serde(default)]
    pub parent_filters: Vec<FilterItem>,
}

impl FilterGroup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_record_filter(mut self, item: FilterItem) -> Self {
        self.record_filters.push(item);
        self
    }

    pub fn with_parent_filter(mut self, item: FilterItem) -> Self {
        self.parent_filters.push(item);
        self
    }
}

/// A declarative status-transition rule.
///
/// When a record of `record_type` reaches `transition_status` and its parent
/// of `parent_type` is not in one of `parent_excluded_statuses`, the parent
/// is transitioned to `parent_target_status`, optionally only once all
/// sibling children agree (`children_lookup`), and optionally continuing up
/// the hierarchy (`process_parent`).
///
/// By convention `parent_excluded_statuses` contains the target status
/// itself, which keeps re-firing idempotent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub record_type: TypeId,
    pub parent_type: TypeId,
    pub transition_status: String,
    #[serde(default)]
    pub parent_excluded_statuses: Vec<String>,
    pub parent_target_status: String,
    #[serde(default)]
    pub children_lookup: bool,
    #[serde(default)]
    pub process_parent: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub filter_groups: Vec<FilterGroup>,
}

impl Rule {
    pub fn new(
        record_type: TypeId,
        parent_type: TypeId,
        transition_status: impl Into<String>,
        parent_target_status: impl Into<String>,
    ) -> Self {
        Self {
            id: RuleId::generate(),
            record_type,
            parent_type,
            transition_status: transition_status.into(),
            parent_excluded_statuses: Vec::new(),
            parent_target_status: parent_target_status.into(),
            children_lookup: false,
            process_parent: false,
            disabled: false,
            filter_groups: Vec::new(),
        }
    }

    pub fn with_excluded_status(mut self, status: impl Into<String>) -> Self {
        self.parent_excluded_statuses.push(status.into());
        self
    }

    pub fn with_children_lookup(mut self) -> Self {
        self.children_lookup = true;
        self
    }

    pub fn with_process_parent(mut self) -> Self {
        self.process_parent = true;
        self
    }

    pub fn with_filter_group(mut self, group: FilterGroup) -> Self {
        self.filter_groups.push(group);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Whether `status` blocks this rule from firing on the parent.
    pub fn excludes_parent_status(&self, status: &str) -> bool {
        self.parent_excluded_statuses.iter().any(|s| s == status)
    }
}

/// All rules for one triggering record type: the unit of persistence and
/// the unit the matcher consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleDocument {
    pub record_type: TypeId,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleDocument {
    pub fn new(record_type: TypeId) -> Self {
        Self {
            record_type,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_rule_ids_are_unique() {
        assert_ne!(RuleId::generate(), RuleId::generate());
    }

    #[test]
    fn excluded_statuses_match_exactly() {
        let rule = Rule::new(
            TypeId::new("task"),
            TypeId::new("user_story"),
            "Closed",
            "Resolved",
        )
        .with_excluded_status("Resolved")
        .with_excluded_status("Closed");

        assert!(rule.excludes_parent_status("Resolved"));
        assert!(rule.excludes_parent_status("Closed"));
        assert!(!rule.excludes_parent_status("Active"));
        assert!(!rule.excludes_parent_status("resolved"));
    }

    #[test]
    fn rule_document_survives_serialization() {
        let doc = RuleDocument::new(TypeId::new("task")).with_rule(
            Rule::new(
                TypeId::new("task"),
                TypeId::new("user_story"),
                "Closed",
                "Resolved",
            )
            .with_children_lookup()
            .with_filter_group(
                FilterGroup::named("backend only").with_record_filter(FilterItem::new(
                    TAGS_FIELD,
                    FilterOperator::Eq,
                    FilterValue::Text("backend".into()),
                )),
            ),
        );

        let json = serde_json::to_string(&doc).unwrap();
        let back: RuleDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.record_type, doc.record_type);
        assert_eq!(back.rules.len(), 1);
        assert!(back.rules[0].children_lookup);
        assert_eq!(back.rules[0].filter_groups[0].record_filters.len(), 1);
    }
}
