use std::collections::HashMap;

use cascade_store::{RuleStore, StoreError, TypeSource};
use cascade_types::{Rule, RuleDocument, TypeCatalog, TypeId};
use tracing::{debug, warn};

use crate::error::EngineResult;

/// Session-scoped rule cache and type catalog.
///
/// One context is built per processing session and passed by reference into
/// the matcher and executor entry points; concurrent sessions never share
/// one. A context can only exist after its reference data has loaded, so
/// "matching before the cache is ready" is unrepresentable.
pub struct EngineContext {
    catalog: TypeCatalog,
    rules: HashMap<TypeId, Vec<Rule>>,
}

impl EngineContext {
    /// Load reference data from the collaborators.
    ///
    /// A rule store that has no documents yet reports not-found; that is an
    /// empty configuration, not a failure. Any other store error propagates.
    pub async fn load(
        rule_store: &dyn RuleStore,
        type_source: &dyn TypeSource,
    ) -> EngineResult<Self> {
        let catalog = TypeCatalog::from_descriptors(type_source.list_types().await?);
        let documents = match rule_store.load_all().await {
            Ok(documents) => documents,
            Err(StoreError::NotFound(_)) => {
                debug!("no rule documents configured");
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self::from_documents(catalog, documents))
    }

    /// Build a context from already-loaded documents.
    ///
    /// Type references in the documents are normalized to canonical ids
    /// here; display names never survive past ingestion. An unresolvable
    /// reference is kept verbatim (such a rule can only ever fail its
    /// type-equality checks) and logged.
    pub fn from_documents(catalog: TypeCatalog, documents: Vec<RuleDocument>) -> Self {
        let mut rules: HashMap<TypeId, Vec<Rule>> = HashMap::new();
        for document in documents {
            let key = canonicalize(&catalog, document.record_type);
            for mut rule in document.rules {
                rule.record_type = canonicalize(&catalog, rule.record_type);
                rule.parent_type = canonicalize(&catalog, rule.parent_type);
                rules.entry(key.clone()).or_default().push(rule);
            }
        }
        Self { catalog, rules }
    }

    /// All configured rules triggered by the given record type.
    pub fn rules_for(&self, record_type: &TypeId) -> &[Rule] {
        self.rules
            .get(record_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn has_rules(&self) -> bool {
        self.rules.values().any(|rules| !rules.is_empty())
    }
}

fn canonicalize(catalog: &TypeCatalog, type_ref: TypeId) -> TypeId {
    match catalog.canonical_id(type_ref.as_str()) {
        Some(id) => id.clone(),
        None => {
            if !catalog.is_empty() {
                warn!(type_ref = %type_ref, "unresolvable type reference in rule document");
            }
            type_ref
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_store::memory::{InMemoryRules, InMemoryTypes};
    use cascade_types::{Rule, TypeDescriptor};

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_descriptors(descriptors())
    }

    fn descriptors() -> Vec<TypeDescriptor> {
        vec![
            TypeDescriptor::new(TypeId::new("task"), "Task").with_state("Closed", "339933"),
            TypeDescriptor::new(TypeId::new("user_story"), "User Story")
                .with_state("Resolved", "ff9d00"),
        ]
    }

    #[test]
    fn documents_keyed_by_display_name_are_canonicalized() {
        let document = RuleDocument::new(TypeId::new("Task")).with_rule(Rule::new(
            TypeId::new("Task"),
            TypeId::new("User Story"),
            "Closed",
            "Resolved",
        ));

        let ctx = EngineContext::from_documents(catalog(), vec![document]);

        let rules = ctx.rules_for(&TypeId::new("task"));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].record_type, TypeId::new("task"));
        assert_eq!(rules[0].parent_type, TypeId::new("user_story"));
        assert!(ctx.rules_for(&TypeId::new("Task")).is_empty());
    }

    #[test]
    fn unknown_type_for_rules_is_empty_slice() {
        let ctx = EngineContext::from_documents(catalog(), Vec::new());
        assert!(ctx.rules_for(&TypeId::new("bug")).is_empty());
        assert!(!ctx.has_rules());
    }

    #[tokio::test]
    async fn load_recovers_missing_rule_documents() {
        let rules = InMemoryRules::new();
        let types = InMemoryTypes::new(descriptors());

        let ctx = EngineContext::load(&rules, &types).await.unwrap();
        assert!(!ctx.has_rules());
        assert!(ctx.catalog().descriptor(&TypeId::new("task")).is_some());
    }

    #[tokio::test]
    async fn load_indexes_documents_by_type() {
        let rules = InMemoryRules::new().with_document(
            RuleDocument::new(TypeId::new("task")).with_rule(Rule::new(
                TypeId::new("task"),
                TypeId::new("user_story"),
                "Closed",
                "Resolved",
            )),
        );
        let types = InMemoryTypes::new(descriptors());

        let ctx = EngineContext::load(&rules, &types).await.unwrap();
        assert_eq!(ctx.rules_for(&TypeId::new("task")).len(), 1);
    }
}
