//! Assignment pipeline orchestration
//!
//! **[TTE-WF-010]** Coordinates one run through three phases:
//!
//! SNAPSHOT → COMPUTE → COMMIT
//!
//! - **SNAPSHOT** (`build_work_list`, here): one read of the taxonomy,
//!   the persisted assignments (usage counts), and the work list.
//!   Taxonomy unavailability aborts before any record is touched.
//! - **COMPUTE** (`compute.rs`): pure matching + balancing per story
//!   against the frozen snapshot; fans out across tasks in batch commit
//!   mode.
//! - **COMMIT** (`commit.rs`): sequential writes with bounded retry,
//!   ledger and checkpoint advance per record.
//!
//! Incremental commit mode interleaves compute and commit per story,
//! sequentially, so each record observes the counts its predecessors
//! committed. **[TTE-WF-020]** Cancellation is honored between records
//! in both modes; a cancelled run reports what it committed and can be
//! resumed by run id.

use crate::config::EngineParams;
use crate::report::RunReport;
use crate::services::{DiversityBalancer, ThemeMatcher, UsageLedger};
use crate::types::{AssignmentStore, CommitMode, LabelSource, RunMode, TaxonomyStore};
use std::collections::HashSet;
use tapestry_common::{Error, Result, ThemeAssignment};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

mod commit;
mod compute;

pub(crate) use compute::compute_story;

/// One story's input to the compute phase
#[derive(Debug, Clone)]
pub(crate) struct StoryWork {
    pub story_id: Uuid,
    pub labels: Vec<String>,
}

/// One story's computed result, awaiting commit
#[derive(Debug, Clone)]
pub(crate) struct StagedStory {
    pub story_id: Uuid,
    /// Balancer output, emission order
    pub theme_ids: Vec<i64>,
    pub source_labels: Vec<String>,
    pub unmatched_labels: usize,
    pub empty_after_balancing: bool,
}

/// Per-story compute outcome
#[derive(Debug, Clone)]
pub(crate) enum ComputeOutcome {
    Staged(StagedStory),
    SkippedNoLabels(Uuid),
}

/// Assignment pipeline
///
/// Generic over the collaborator traits so tests can substitute
/// in-memory fakes for every external dependency.
pub struct AssignmentPipeline<T, L, S> {
    taxonomy: T,
    labels: L,
    store: S,
    params: EngineParams,
    matcher: ThemeMatcher,
}

impl<T, L, S> AssignmentPipeline<T, L, S>
where
    T: TaxonomyStore,
    L: LabelSource,
    S: AssignmentStore,
{
    pub fn new(taxonomy: T, labels: L, store: S, params: EngineParams) -> Self {
        Self {
            taxonomy,
            labels,
            store,
            params,
            matcher: ThemeMatcher::new(),
        }
    }

    /// Execute one run under a fresh run id
    pub async fn run(&self, mode: RunMode, cancel: &CancellationToken) -> Result<RunReport> {
        self.run_with_id(Uuid::new_v4(), mode, cancel).await
    }

    /// Execute (or resume) one run under a caller-supplied run id
    ///
    /// Resume semantics: stories already carrying an assignment written
    /// under `run_id` are skipped, so re-invoking after an interruption
    /// picks up where the checkpoint left off.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        mode: RunMode,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        tracing::info!(run_id = %run_id, mode = %mode, commit_mode = %self.params.commit_mode, "Starting assignment run");

        // Phase 1: SNAPSHOT
        let themes = self
            .taxonomy
            .list_active_themes()
            .await
            .map_err(|e| match e {
                Error::TaxonomyUnavailable(_) => e,
                other => Error::TaxonomyUnavailable(other.to_string()),
            })?;
        if themes.is_empty() {
            return Err(Error::TaxonomyUnavailable(
                "taxonomy returned zero active themes".to_string(),
            ));
        }

        let existing = self.store.load_all_assignments().await?;
        let mut ledger = UsageLedger::from_assignments(&existing);
        let work = self.build_work_list(mode, run_id, &existing).await?;

        tracing::info!(
            run_id = %run_id,
            stories = work.len(),
            themes = themes.len(),
            existing_assignments = existing.len(),
            "Phase 1: SNAPSHOT complete"
        );

        let balancer = DiversityBalancer {
            min_diversity: self.params.min_diversity,
            max_categories: self.params.max_categories,
            overuse_threshold: self.params.overuse_threshold,
        };
        let mut report = RunReport::new(run_id, mode, self.params.commit_mode);

        match self.params.commit_mode {
            CommitMode::Batch => {
                // Phase 2: COMPUTE against one frozen snapshot
                let snapshot = ledger.snapshot();
                let outcomes = self
                    .phase_compute(work, &themes, &snapshot, &balancer, cancel)
                    .await?;

                // Phase 3: COMMIT sequentially
                self.phase_commit(outcomes, run_id, &mut ledger, &mut report, cancel)
                    .await?;
            }
            CommitMode::Incremental => {
                // Compute and commit per story; each record sees the
                // counts its predecessors committed.
                for item in work {
                    if cancel.is_cancelled() {
                        tracing::info!(run_id = %run_id, "Run cancelled between records");
                        break;
                    }
                    let snapshot = ledger.snapshot();
                    let outcome =
                        compute_story(&item, &themes, &snapshot, &self.matcher, &balancer);
                    self.commit_outcome(outcome, run_id, &mut ledger, &mut report)
                        .await?;
                }
            }
        }

        report.cancelled = cancel.is_cancelled();
        report.finish();

        if let Some((theme_id, share)) = report.max_share() {
            if share > 0.60 {
                tracing::warn!(
                    run_id = %run_id,
                    theme_id,
                    share,
                    "Single theme dominates this run's assignments"
                );
            }
        }
        tracing::info!(run_id = %run_id, "{}", report.display_string());

        Ok(report)
    }

    /// Build the run's work list (part of the snapshot phase)
    ///
    /// Fresh mode: stories the generator labeled that have no
    /// assignment yet. Reassign mode: every assigned story, replaying
    /// the labels its assignment was first computed from.
    async fn build_work_list(
        &self,
        mode: RunMode,
        run_id: Uuid,
        existing: &[ThemeAssignment],
    ) -> Result<Vec<StoryWork>> {
        let mut work = Vec::new();
        match mode {
            RunMode::Fresh => {
                let assigned: HashSet<Uuid> = existing.iter().map(|a| a.story_id).collect();
                for story_id in self.labels.story_ids().await? {
                    if assigned.contains(&story_id) {
                        tracing::debug!(story_id = %story_id, "Already assigned, skipping");
                        continue;
                    }
                    let labels = self.labels.raw_labels(story_id).await?;
                    work.push(StoryWork { story_id, labels });
                }
            }
            RunMode::Reassign => {
                for assignment in existing {
                    if assignment.run_id == run_id {
                        // Resume: this run already rewrote the story.
                        tracing::debug!(story_id = %assignment.story_id, "Already reassigned in this run, skipping");
                        continue;
                    }
                    work.push(StoryWork {
                        story_id: assignment.story_id,
                        labels: assignment.source_labels.clone(),
                    });
                }
            }
        }

        // Stable processing order makes incremental-mode results and
        // all reports reproducible.
        work.sort_by_key(|item| item.story_id);
        Ok(work)
    }
}
