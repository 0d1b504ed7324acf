//! Cascade data model.
//!
//! Records are read-only snapshots of hierarchical entities; rules are the
//! declarative configuration that transitions a parent record's status when
//! a child reaches a given status. The type catalog is the single canonical
//! mapping between display names and stable type identifiers; nothing past
//! the catalog ever compares display names.

#![deny(unsafe_code)]

mod catalog;
mod record;
mod rule;

pub use catalog::{StateDescriptor, TypeCatalog, TypeDescriptor};
pub use record::{AttrValue, IdentityRef, Record, RecordId, TypeId};
pub use rule::{
    FilterGroup, FilterItem, FilterOperator, FilterValue, Rule, RuleDocument, RuleId, TAGS_FIELD,
};
