//! Phase 3: COMMIT
//!
//! **[TTE-WF-030]** Sequential persistence of staged results. Each
//! story's write is atomic and independent: a failure after retries
//! marks that record failed in the report and processing moves on. The
//! ledger and checkpoint advance only after a successful write, so a
//! crash mid-run never leaves a half-updated ledger.

use super::{AssignmentPipeline, ComputeOutcome};
use crate::report::RunReport;
use crate::services::UsageLedger;
use crate::types::{AssignmentStore, LabelSource, TaxonomyStore};
use std::time::Duration;
use tapestry_common::{Error, Result, ThemeAssignment};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Bounded retry budget for a single assignment write
const COMMIT_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

impl<T, L, S> AssignmentPipeline<T, L, S>
where
    T: TaxonomyStore,
    L: LabelSource,
    S: AssignmentStore,
{
    /// Commit every staged outcome in story order
    pub(super) async fn phase_commit(
        &self,
        outcomes: Vec<ComputeOutcome>,
        run_id: Uuid,
        ledger: &mut UsageLedger,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for outcome in outcomes {
            if cancel.is_cancelled() {
                tracing::info!(run_id = %run_id, "Run cancelled between records");
                break;
            }
            self.commit_outcome(outcome, run_id, ledger, report).await?;
        }
        tracing::info!(
            run_id = %run_id,
            committed = report.processed,
            failed = report.failed,
            "Phase 3: COMMIT complete"
        );
        Ok(())
    }

    /// Land one story: write, then advance ledger, report, checkpoint
    pub(super) async fn commit_outcome(
        &self,
        outcome: ComputeOutcome,
        run_id: Uuid,
        ledger: &mut UsageLedger,
        report: &mut RunReport,
    ) -> Result<()> {
        let staged = match outcome {
            ComputeOutcome::SkippedNoLabels(story_id) => {
                tracing::info!(story_id = %story_id, "No usable labels; story skipped");
                report.skipped_no_labels += 1;
                return Ok(());
            }
            ComputeOutcome::Staged(staged) => staged,
        };

        let assignment = ThemeAssignment::new(
            staged.story_id,
            staged.theme_ids,
            staged.source_labels,
            run_id,
        );

        match self.write_with_retry(&assignment).await {
            Ok(()) => {
                ledger.commit(&assignment.theme_ids);
                report.record_commit(&assignment.theme_ids);
                report.unmatched_labels += staged.unmatched_labels;
                if staged.empty_after_balancing {
                    report.empty_after_balancing += 1;
                }
                // Checkpoint loss only costs resume granularity; it must
                // not fail a record whose assignment already landed.
                if let Err(err) = self
                    .store
                    .save_checkpoint(run_id, assignment.story_id, report.processed as i64)
                    .await
                {
                    tracing::warn!(story_id = %assignment.story_id, error = %err, "Checkpoint write failed");
                }
                tracing::debug!(
                    story_id = %assignment.story_id,
                    themes = ?assignment.theme_ids,
                    "Assignment committed"
                );
            }
            Err(err) => {
                tracing::error!(
                    story_id = %assignment.story_id,
                    error = %err,
                    "Assignment write failed after retries; continuing with next record"
                );
                report.failed += 1;
            }
        }
        Ok(())
    }

    /// Retry a write with exponential backoff, at most [`COMMIT_ATTEMPTS`]
    async fn write_with_retry(&self, assignment: &ThemeAssignment) -> Result<()> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = String::new();

        for attempt in 1..=COMMIT_ATTEMPTS {
            match self.store.write_assignment(assignment).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::debug!(
                            story_id = %assignment.story_id,
                            attempt,
                            "Assignment write succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        story_id = %assignment.story_id,
                        attempt,
                        error = %err,
                        "Assignment write failed"
                    );
                    last_error = err.to_string();
                    if attempt < COMMIT_ATTEMPTS {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        Err(Error::PersistenceWrite {
            story_id: assignment.story_id,
            attempts: COMMIT_ATTEMPTS,
            message: last_error,
        })
    }
}
