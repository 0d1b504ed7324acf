use cascade_types::{FilterGroup, FilterItem, Record, Rule};

use crate::filter::filter_matches;

/// Evaluate one filter group against a record and its parent.
///
/// Record-scoped filters run against the record's attributes, parent-scoped
/// filters against the parent's. Every filter within a scope must match; an
/// empty scope passes vacuously; both scopes must pass.
pub fn group_matches(group: &FilterGroup, record: &Record, parent: &Record) -> bool {
    scope_matches(&group.record_filters, record) && scope_matches(&group.parent_filters, parent)
}

fn scope_matches(filters: &[FilterItem], record: &Record) -> bool {
    filters
        .iter()
        .all(|item| filter_matches(item, record.attr(&item.field)))
}

/// Evaluate a rule's filter groups: no groups means no filtering was
/// requested; otherwise at least one group must pass.
pub fn filter_groups_match(rule: &Rule, record: &Record, parent: &Record) -> bool {
    if rule.filter_groups.is_empty() {
        return true;
    }
    rule.filter_groups
        .iter()
        .any(|group| group_matches(group, record, parent))
}
