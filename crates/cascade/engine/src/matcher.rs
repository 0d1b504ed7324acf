use std::collections::HashMap;
use std::sync::Arc;

use cascade_store::RecordSource;
use cascade_types::{Record, Rule, TypeId};
use tracing::debug;

use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::group::filter_groups_match;

/// The shallow rule decision: everything except the sibling consistency
/// check. This is exactly the `check_children = false` mode of
/// [`RuleMatcher::is_match`], and the predicate siblings are validated
/// against, which keeps the evaluation depth capped at one level.
///
/// Short-circuit order, cheapest first: disabled flag, record type, parent
/// type, transition status, parent exclusion set, filter groups.
pub fn rule_applies(rule: &Rule, record: &Record, parent: &Record) -> bool {
    if rule.disabled {
        return false;
    }
    if record.type_id != rule.record_type {
        return false;
    }
    if parent.type_id != rule.parent_type {
        return false;
    }
    if record.status != rule.transition_status {
        return false;
    }
    if rule.excludes_parent_status(&parent.status) {
        return false;
    }
    filter_groups_match(rule, record, parent)
}

/// The full rule decision procedure, including sibling consistency.
pub struct RuleMatcher {
    records: Arc<dyn RecordSource>,
}

impl RuleMatcher {
    pub fn new(records: Arc<dyn RecordSource>) -> Self {
        Self { records }
    }

    /// Does `rule` apply to this transition?
    ///
    /// With `check_children` set and a children-lookup rule, all of the
    /// parent's children must agree before the rule fires (see
    /// [`Self::children_consistent`]); otherwise the shallow decision is
    /// the answer. The only failure mode is a collaborator transport
    /// error from the children fetch.
    pub async fn is_match(
        &self,
        ctx: &EngineContext,
        rule: &Rule,
        record: &Record,
        parent: &Record,
        check_children: bool,
    ) -> EngineResult<bool> {
        if !rule_applies(rule, record, parent) {
            return Ok(false);
        }
        if rule.children_lookup && check_children {
            return self
                .children_consistent(ctx, rule, &record.type_id, parent)
                .await;
        }
        Ok(true)
    }

    /// Sibling consistency: do all of the parent's children agree that the
    /// parent is ready for `rule.parent_target_status`?
    ///
    /// When every child shares the triggering record's type, agreement
    /// means every child has reached the rule's transition status. With
    /// mixed child types, each type present must have at least one rule
    /// producing the same parent transition, and every child of that type
    /// must shallowly satisfy every such candidate; a child's own
    /// children are never inspected. An empty child set is trivially
    /// consistent.
    async fn children_consistent(
        &self,
        ctx: &EngineContext,
        rule: &Rule,
        record_type: &TypeId,
        parent: &Record,
    ) -> EngineResult<bool> {
        let children = self.records.fetch_children(parent.id).await?;
        if children.is_empty() {
            return Ok(true);
        }

        if children.iter().all(|child| child.type_id == *record_type) {
            let consistent = children
                .iter()
                .all(|child| child.status == rule.transition_status);
            if !consistent {
                debug!(
                    rule = %rule.id,
                    parent = %parent.id,
                    "sibling not yet at transition status"
                );
            }
            return Ok(consistent);
        }

        let mut by_type: HashMap<&TypeId, Vec<&Record>> = HashMap::new();
        for child in &children {
            by_type.entry(&child.type_id).or_default().push(child);
        }

        for (child_type, members) in by_type {
            let candidates: Vec<&Rule> = ctx
                .rules_for(child_type)
                .iter()
                .filter(|candidate| {
                    !candidate.disabled
                        && candidate.parent_type == rule.parent_type
                        && candidate.parent_target_status == rule.parent_target_status
                })
                .collect();

            if candidates.is_empty() {
                debug!(
                    rule = %rule.id,
                    child_type = %child_type,
                    "no qualifying rule for child type"
                );
                return Ok(false);
            }

            for child in members {
                for candidate in &candidates {
                    if !rule_applies(candidate, child, parent) {
                        debug!(
                            rule = %rule.id,
                            candidate = %candidate.id,
                            child = %child.id,
                            "child does not satisfy candidate rule"
                        );
                        return Ok(false);
                    }
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_store::InMemoryRecords;
    use cascade_types::{
        AttrValue, FilterGroup, FilterItem, FilterOperator, FilterValue, RecordId, RuleDocument,
        TypeCatalog, TypeDescriptor,
    };

    const STORY: RecordId = RecordId(9);

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_descriptors(vec![
            TypeDescriptor::new(TypeId::new("task"), "Task"),
            TypeDescriptor::new(TypeId::new("bug"), "Bug"),
            TypeDescriptor::new(TypeId::new("user_story"), "User Story"),
        ])
    }

    fn empty_ctx() -> EngineContext {
        EngineContext::from_documents(catalog(), Vec::new())
    }

    fn task_rule() -> Rule {
        Rule::new(
            TypeId::new("task"),
            TypeId::new("user_story"),
            "Closed",
            "Resolved",
        )
        .with_excluded_status("Resolved")
        .with_excluded_status("Closed")
    }

    fn story(status: &str) -> Record {
        Record::new(STORY, TypeId::new("user_story"), status, "story")
    }

    fn task(id: u64, status: &str) -> Record {
        Record::new(RecordId(id), TypeId::new("task"), status, "task").with_parent(STORY)
    }

    fn bug(id: u64, status: &str) -> Record {
        Record::new(RecordId(id), TypeId::new("bug"), status, "bug").with_parent(STORY)
    }

    fn matcher_with(records: &[Record]) -> RuleMatcher {
        let source = InMemoryRecords::new();
        for record in records {
            source.insert(record.clone());
        }
        RuleMatcher::new(Arc::new(source))
    }

    #[test]
    fn shallow_match_requires_record_type() {
        let rule = task_rule();
        let mismatched = Record::new(RecordId(11), TypeId::new("bug"), "Closed", "bug")
            .with_parent(STORY);
        assert!(rule_applies(&rule, &task(11, "Closed"), &story("Active")));
        assert!(!rule_applies(&rule, &mismatched, &story("Active")));
    }

    #[test]
    fn shallow_match_requires_parent_type() {
        let rule = task_rule();
        let wrong_parent = Record::new(STORY, TypeId::new("bug"), "Active", "not a story");
        assert!(!rule_applies(&rule, &task(11, "Closed"), &wrong_parent));
    }

    #[test]
    fn shallow_match_requires_transition_status() {
        let rule = task_rule();
        assert!(!rule_applies(&rule, &task(11, "Active"), &story("Active")));
    }

    #[test]
    fn excluded_parent_status_blocks_the_rule() {
        let rule = task_rule();
        assert!(!rule_applies(&rule, &task(11, "Closed"), &story("Resolved")));
        assert!(!rule_applies(&rule, &task(11, "Closed"), &story("Closed")));
        assert!(rule_applies(&rule, &task(11, "Closed"), &story("Active")));
    }

    #[test]
    fn disabled_rule_never_applies() {
        let rule = task_rule().disabled();
        assert!(!rule_applies(&rule, &task(11, "Closed"), &story("Active")));
    }

    #[test]
    fn filter_groups_participate_in_shallow_match() {
        let rule = task_rule().with_filter_group(
            FilterGroup::named("backend").with_record_filter(FilterItem::new(
                "area",
                FilterOperator::Eq,
                FilterValue::Text("backend".into()),
            )),
        );
        let matching = task(11, "Closed").with_attr("area", AttrValue::text("backend"));
        assert!(rule_applies(&rule, &matching, &story("Active")));
        assert!(!rule_applies(&rule, &task(11, "Closed"), &story("Active")));
    }

    #[tokio::test]
    async fn no_children_lookup_ignores_children_entirely() {
        let ctx = empty_ctx();
        let rule = task_rule();
        let record = task(11, "Closed");

        for siblings in [
            vec![],
            vec![task(12, "Active")],
            vec![task(12, "Active"), task(13, "New")],
        ] {
            let mut records = vec![story("Active"), record.clone()];
            records.extend(siblings);
            let matcher = matcher_with(&records);
            let matched = matcher
                .is_match(&ctx, &rule, &record, &story("Active"), true)
                .await
                .unwrap();
            assert!(matched);
        }
    }

    #[tokio::test]
    async fn check_children_false_skips_the_sibling_check() {
        let ctx = empty_ctx();
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");
        let matcher = matcher_with(&[story("Active"), record.clone(), task(12, "Active")]);

        let matched = matcher
            .is_match(&ctx, &rule, &record, &story("Active"), false)
            .await
            .unwrap();
        assert!(matched);
    }

    #[tokio::test]
    async fn same_type_children_must_all_reach_transition_status() {
        let ctx = empty_ctx();
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");

        let all_closed = matcher_with(&[
            story("Active"),
            record.clone(),
            task(12, "Closed"),
            task(13, "Closed"),
        ]);
        assert!(all_closed
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());

        let one_off = matcher_with(&[
            story("Active"),
            record.clone(),
            task(12, "Closed"),
            task(13, "Active"),
        ]);
        assert!(!one_off
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn empty_child_set_is_trivially_consistent() {
        let ctx = empty_ctx();
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");
        // The record itself is not seeded, so the parent has no children at
        // fetch time.
        let matcher = matcher_with(&[story("Active")]);

        assert!(matcher
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn mixed_children_fail_without_a_qualifying_rule() {
        // Tasks have a rule targeting Resolved; bugs have none at all.
        let ctx = EngineContext::from_documents(
            catalog(),
            vec![RuleDocument::new(TypeId::new("task")).with_rule(task_rule())],
        );
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");
        let matcher = matcher_with(&[
            story("Active"),
            record.clone(),
            bug(21, "Closed"),
        ]);

        assert!(!matcher
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn mixed_children_match_when_every_type_agrees() {
        let bug_rule = Rule::new(
            TypeId::new("bug"),
            TypeId::new("user_story"),
            "Closed",
            "Resolved",
        );
        let ctx = EngineContext::from_documents(
            catalog(),
            vec![
                RuleDocument::new(TypeId::new("task")).with_rule(task_rule()),
                RuleDocument::new(TypeId::new("bug")).with_rule(bug_rule),
            ],
        );
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");

        let agreeing = matcher_with(&[
            story("Active"),
            record.clone(),
            bug(21, "Closed"),
        ]);
        assert!(agreeing
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());

        let lagging_bug = matcher_with(&[
            story("Active"),
            record.clone(),
            bug(21, "Active"),
        ]);
        assert!(!lagging_bug
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn mixed_children_ignore_rules_for_other_parent_transitions() {
        // The bug rule exists but produces a different parent transition,
        // so it cannot vouch for the bug subset.
        let unrelated_bug_rule = Rule::new(
            TypeId::new("bug"),
            TypeId::new("user_story"),
            "Closed",
            "Closed",
        );
        let ctx = EngineContext::from_documents(
            catalog(),
            vec![
                RuleDocument::new(TypeId::new("task")).with_rule(task_rule()),
                RuleDocument::new(TypeId::new("bug")).with_rule(unrelated_bug_rule),
            ],
        );
        let rule = task_rule().with_children_lookup();
        let record = task(11, "Closed");
        let matcher = matcher_with(&[
            story("Active"),
            record.clone(),
            bug(21, "Closed"),
        ]);

        assert!(!matcher
            .is_match(&ctx, &rule, &record, &story("Active"), true)
            .await
            .unwrap());
    }
}
