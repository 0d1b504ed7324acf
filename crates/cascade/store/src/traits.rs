use async_trait::async_trait;
use cascade_types::{Record, RecordId, RuleDocument, TypeDescriptor};

use crate::StoreResult;

/// Source of record snapshots and the single mutation point.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one record by id. `StoreError::NotFound` if it does not exist.
    async fn fetch(&self, id: RecordId) -> StoreResult<Record>;

    /// Fetch a record's parent, `None` if no parent relation exists.
    async fn fetch_parent(&self, id: RecordId) -> StoreResult<Option<Record>>;

    /// Fetch all children of a record, empty if none.
    async fn fetch_children(&self, id: RecordId) -> StoreResult<Vec<Record>>;

    /// Apply a status change and return the updated record.
    async fn update_status(&self, id: RecordId, status: &str) -> StoreResult<Record>;
}

/// Source of type reference data.
#[async_trait]
pub trait TypeSource: Send + Sync {
    /// All known record types with their valid states.
    async fn list_types(&self) -> StoreResult<Vec<TypeDescriptor>>;
}

/// Persistence of rule documents, keyed by triggering record type.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Load the full rule configuration.
    ///
    /// `StoreError::NotFound` means no rules have been configured yet; the
    /// engine treats it as an empty rule set, not a failure.
    async fn load_all(&self) -> StoreResult<Vec<RuleDocument>>;

    /// Persist one type's rule set. Owned by rule-authoring flows; the
    /// engine never calls this.
    async fn save(&self, document: RuleDocument) -> StoreResult<RuleDocument>;
}
