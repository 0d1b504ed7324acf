//! In-memory reference adapters.
//!
//! Deterministic and test-friendly, mirroring the narrow surface a real
//! host backend exposes. Child relations are derived from parent links so
//! seeded hierarchies cannot drift out of sync.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cascade_types::{Record, RecordId, RuleDocument, TypeDescriptor, TypeId};

use crate::traits::{RecordSource, RuleStore, TypeSource};
use crate::{StoreError, StoreResult};

/// In-memory record hierarchy.
#[derive(Default)]
pub struct InMemoryRecords {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record snapshot.
    pub fn insert(&self, record: Record) {
        let mut guard = self.records.write().expect("records lock poisoned");
        guard.insert(record.id, record);
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<RecordId, Record>>> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordSource for InMemoryRecords {
    async fn fetch(&self, id: RecordId) -> StoreResult<Record> {
        let guard = self.read()?;
        guard
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))
    }

    async fn fetch_parent(&self, id: RecordId) -> StoreResult<Option<Record>> {
        let guard = self.read()?;
        let record = guard
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
        Ok(record.parent.and_then(|pid| guard.get(&pid).cloned()))
    }

    async fn fetch_children(&self, id: RecordId) -> StoreResult<Vec<Record>> {
        let guard = self.read()?;
        let mut children: Vec<Record> = guard
            .values()
            .filter(|r| r.parent == Some(id))
            .cloned()
            .collect();
        children.sort_by_key(|r| r.id.0);
        Ok(children)
    }

    async fn update_status(&self, id: RecordId, status: &str) -> StoreResult<Record> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("records lock poisoned".to_string()))?;
        let record = guard
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
        record.status = status.to_string();
        Ok(record.clone())
    }
}

/// In-memory type reference data.
pub struct InMemoryTypes {
    descriptors: Vec<TypeDescriptor>,
}

impl InMemoryTypes {
    pub fn new(descriptors: Vec<TypeDescriptor>) -> Self {
        Self { descriptors }
    }
}

#[async_trait]
impl TypeSource for InMemoryTypes {
    async fn list_types(&self) -> StoreResult<Vec<TypeDescriptor>> {
        Ok(self.descriptors.clone())
    }
}

/// In-memory rule document store.
///
/// `load_all` reports `NotFound` while no document has ever been saved,
/// matching backends where the rule collection does not exist until the
/// first authoring flow writes to it.
#[derive(Default)]
pub struct InMemoryRules {
    documents: RwLock<HashMap<TypeId, RuleDocument>>,
}

impl InMemoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document: RuleDocument) -> Self {
        {
            let mut guard = self.documents.write().expect("documents lock poisoned");
            guard.insert(document.record_type.clone(), document);
        }
        self
    }
}

#[async_trait]
impl RuleStore for InMemoryRules {
    async fn load_all(&self) -> StoreResult<Vec<RuleDocument>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StoreError::Backend("documents lock poisoned".to_string()))?;
        if guard.is_empty() {
            return Err(StoreError::NotFound("no rule documents".to_string()));
        }
        let mut documents: Vec<RuleDocument> = guard.values().cloned().collect();
        documents.sort_by(|a, b| a.record_type.0.cmp(&b.record_type.0));
        Ok(documents)
    }

    async fn save(&self, document: RuleDocument) -> StoreResult<RuleDocument> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StoreError::Backend("documents lock poisoned".to_string()))?;
        guard.insert(document.record_type.clone(), document.clone());
        Ok(document)
    }
}
