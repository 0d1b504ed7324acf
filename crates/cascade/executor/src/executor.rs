use std::sync::Arc;

use cascade_engine::{EngineContext, EngineResult, RuleMatcher};
use cascade_store::{RecordSource, RuleStore, StoreError, TypeSource};
use cascade_types::{RecordId, RuleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One parent status change applied during a processing session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppliedTransition {
    pub rule_id: RuleId,
    pub record_id: RecordId,
    pub parent_id: RecordId,
    pub from_status: String,
    pub to_status: String,
    pub applied_at: DateTime<Utc>,
}

/// Orchestrates rule matching for a changed record and applies the implied
/// parent transitions.
///
/// Each call to [`Self::process`] is one session: reference data is loaded
/// once into an [`EngineContext`], records are fetched fresh, and every
/// matching rule's update is applied sequentially. Multiple matching rules
/// race on the parent: last write wins, no conflict detection. The
/// excluded-status convention keeps re-firing rare in steady state.
pub struct TransitionExecutor {
    records: Arc<dyn RecordSource>,
    rules: Arc<dyn RuleStore>,
    types: Arc<dyn TypeSource>,
}

impl TransitionExecutor {
    pub fn new(
        records: Arc<dyn RecordSource>,
        rules: Arc<dyn RuleStore>,
        types: Arc<dyn TypeSource>,
    ) -> Self {
        Self {
            records,
            rules,
            types,
        }
    }

    /// Process a record's status change in a fresh session.
    pub async fn process(&self, record_id: RecordId) -> EngineResult<Vec<AppliedTransition>> {
        let ctx = EngineContext::load(&*self.rules, &*self.types).await?;
        self.process_with(&ctx, record_id).await
    }

    /// Process a record's status change within an existing session context.
    ///
    /// Walks up the hierarchy as long as a fired rule requests parent
    /// processing: once a parent's status changes, the parent becomes the
    /// changed record of the next round.
    pub async fn process_with(
        &self,
        ctx: &EngineContext,
        record_id: RecordId,
    ) -> EngineResult<Vec<AppliedTransition>> {
        let matcher = RuleMatcher::new(self.records.clone());
        let mut applied = Vec::new();
        let mut current = record_id;

        loop {
            let record = match self.records.fetch(current).await {
                Ok(record) => record,
                Err(StoreError::NotFound(_)) => {
                    debug!(record = %current, "record no longer exists, nothing to process");
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            let Some(parent) = self.records.fetch_parent(current).await? else {
                debug!(record = %current, "no parent, nothing to process");
                break;
            };

            let candidates = ctx.rules_for(&record.type_id);
            if candidates.is_empty() {
                debug!(record_type = %record.type_id, "no rules configured for type");
                break;
            }

            info!(
                record = %record.id,
                status = %record.status,
                parent = %parent.id,
                candidates = candidates.len(),
                "processing status change"
            );

            let mut cascade = false;
            let mut last_target: Option<&str> = None;
            for rule in candidates {
                if !matcher.is_match(ctx, rule, &record, &parent, true).await? {
                    continue;
                }

                if let Some(previous) = last_target {
                    if previous != rule.parent_target_status {
                        warn!(
                            parent = %parent.id,
                            previous,
                            next = %rule.parent_target_status,
                            "matched rules disagree on target status, last write wins"
                        );
                    }
                }
                last_target = Some(&rule.parent_target_status);

                let updated = self
                    .records
                    .update_status(parent.id, &rule.parent_target_status)
                    .await?;
                info!(
                    rule = %rule.id,
                    parent = %parent.id,
                    from = %parent.status,
                    to = %updated.status,
                    "applied parent transition"
                );
                applied.push(AppliedTransition {
                    rule_id: rule.id.clone(),
                    record_id: record.id,
                    parent_id: parent.id,
                    from_status: parent.status.clone(),
                    to_status: rule.parent_target_status.clone(),
                    applied_at: Utc::now(),
                });
                cascade |= rule.process_parent;
            }

            if !cascade {
                break;
            }
            current = parent.id;
        }

        Ok(applied)
    }
}
