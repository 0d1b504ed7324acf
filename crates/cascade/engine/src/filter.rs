use std::collections::HashSet;

use cascade_types::{AttrValue, FilterItem, FilterOperator, FilterValue, TAGS_FIELD};

/// Delimiter of tag-list values on both the filter and the record side.
const TAG_DELIMITER: char = ';';

/// Evaluate one attribute comparison against a record's attribute value.
///
/// An absent attribute never matches, regardless of operator. Unsupported
/// type/operator combinations resolve to `false` rather than an error, so
/// the decision procedure stays total.
pub fn filter_matches(item: &FilterItem, actual: Option<&AttrValue>) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    if item.field == TAGS_FIELD {
        return tags_match(item, actual);
    }

    match &item.value {
        FilterValue::Text(expected) | FilterValue::PlainText(expected) => {
            let AttrValue::Text(actual) = actual else {
                return false;
            };
            match item.operator {
                FilterOperator::Eq => actual == expected,
                FilterOperator::Ne => actual != expected,
                _ => false,
            }
        }
        FilterValue::Boolean(expected) => {
            let AttrValue::Boolean(actual) = actual else {
                return false;
            };
            match item.operator {
                FilterOperator::Eq => actual == expected,
                FilterOperator::Ne => actual != expected,
                _ => false,
            }
        }
        FilterValue::Integer(expected) => {
            let Some(actual) = actual.as_integer() else {
                return false;
            };
            match item.operator {
                FilterOperator::Eq => actual == *expected,
                FilterOperator::Ne => actual != *expected,
                FilterOperator::Gt => actual > *expected,
                FilterOperator::Ge => actual >= *expected,
                FilterOperator::Lt => actual < *expected,
                FilterOperator::Le => actual <= *expected,
            }
        }
        FilterValue::Identity(expected) => {
            let AttrValue::Identity(actual) = actual else {
                return false;
            };
            match item.operator {
                FilterOperator::Eq => actual.descriptor == *expected,
                FilterOperator::Ne => actual.descriptor != *expected,
                _ => false,
            }
        }
    }
}

/// Tag-list comparison under the reserved `tags` field.
///
/// `Eq` is a subset test: every filter tag must be present on the record.
/// `Ne` requires the record's tags and the filter's tags to be disjoint.
fn tags_match(item: &FilterItem, actual: &AttrValue) -> bool {
    let expected = match &item.value {
        FilterValue::Text(s) | FilterValue::PlainText(s) => s,
        _ => return false,
    };
    let AttrValue::Text(actual) = actual else {
        return false;
    };

    let filter_tags = split_tags(expected);
    let record_tags = split_tags(actual);

    match item.operator {
        FilterOperator::Eq => filter_tags.iter().all(|tag| record_tags.contains(tag)),
        FilterOperator::Ne => record_tags.iter().all(|tag| !filter_tags.contains(tag)),
        _ => false,
    }
}

fn split_tags(value: &str) -> HashSet<&str> {
    value
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}
