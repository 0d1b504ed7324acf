//! Cascade rule-matching and hierarchy-consistency engine.
//!
//! Given a changed record, its parent, and (when a rule asks for it) the
//! parent's full child set, the engine decides which configured rules apply
//! and what parent transition they imply. The decision procedure is total:
//! malformed filter/operator combinations resolve to "not matched," and the
//! only errors that leave the engine are collaborator transport failures.
//!
//! Evaluation is layered the way the data model is:
//!
//! - [`filter_matches`]: one attribute comparison
//! - [`group_matches`] / [`filter_groups_match`]: OR across groups, AND
//!   within a scope
//! - [`rule_applies`] / [`RuleMatcher`]: the full decision, including the
//!   sibling consistency check
//!
//! All matching arithmetic is synchronous; the only suspension point is the
//! children fetch inside [`RuleMatcher::is_match`]. State is scoped to an
//! [`EngineContext`] built per processing session; there is no shared
//! mutable engine state.

#![deny(unsafe_code)]

mod context;
mod error;
mod filter;
mod group;
mod matcher;

pub use context::EngineContext;
pub use error::{EngineError, EngineResult};
pub use filter::filter_matches;
pub use group::{filter_groups_match, group_matches};
pub use matcher::{rule_applies, RuleMatcher};
