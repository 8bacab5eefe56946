//! Phase 2: COMPUTE
//!
//! Pure matching + balancing per story against the frozen snapshot.
//! **[TTE-WF-010]** No I/O happens here; everything a record needs was
//! read in the snapshot phase, which is what lets this phase fan out
//! across tasks with no shared mutable state.

use super::{AssignmentPipeline, ComputeOutcome, StagedStory, StoryWork};
use crate::services::theme_matcher::NEAR_MISS_THRESHOLD;
use crate::services::{DiversityBalancer, ThemeMatcher, UsageSnapshot};
use crate::types::{AssignmentStore, LabelSource, TaxonomyStore};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tapestry_common::{Error, Result, Theme};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

impl ComputeOutcome {
    pub(crate) fn story_id(&self) -> Uuid {
        match self {
            ComputeOutcome::Staged(staged) => staged.story_id,
            ComputeOutcome::SkippedNoLabels(story_id) => *story_id,
        }
    }
}

impl<T, L, S> AssignmentPipeline<T, L, S>
where
    T: TaxonomyStore,
    L: LabelSource,
    S: AssignmentStore,
{
    /// Compute every story in the work list against one frozen snapshot
    ///
    /// With `parallelism > 1` stories fan out over blocking tasks,
    /// bounded by the configured worker count. Results are re-sorted by
    /// story id afterwards since task completion order is arbitrary.
    /// **[TTE-WF-020]** Cancellation stops new work; in-flight stories
    /// still drain.
    pub(super) async fn phase_compute(
        &self,
        work: Vec<StoryWork>,
        themes: &[Theme],
        snapshot: &UsageSnapshot,
        balancer: &DiversityBalancer,
        cancel: &CancellationToken,
    ) -> Result<Vec<ComputeOutcome>> {
        let total = work.len();

        if self.params.parallelism <= 1 || total <= 1 {
            let mut outcomes = Vec::with_capacity(total);
            for item in work {
                if cancel.is_cancelled() {
                    break;
                }
                outcomes.push(compute_story(&item, themes, snapshot, &self.matcher, balancer));
            }
            tracing::info!(computed = outcomes.len(), total, "Phase 2: COMPUTE complete");
            return Ok(outcomes);
        }

        let themes = Arc::new(themes.to_vec());
        let snapshot = Arc::new(snapshot.clone());
        let balancer = *balancer;
        let mut queue = work.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(total);

        loop {
            while in_flight.len() < self.params.parallelism && !cancel.is_cancelled() {
                let Some(item) = queue.next() else { break };
                let themes = Arc::clone(&themes);
                let snapshot = Arc::clone(&snapshot);
                in_flight.push(tokio::task::spawn_blocking(move || {
                    let matcher = ThemeMatcher::new();
                    compute_story(&item, &themes, &snapshot, &matcher, &balancer)
                }));
            }
            match in_flight.next().await {
                Some(result) => outcomes.push(
                    result.map_err(|e| Error::Internal(format!("compute task failed: {}", e)))?,
                ),
                None => break,
            }
        }

        // Task completion order is arbitrary; restore story order so the
        // commit phase and its checkpoints stay deterministic.
        outcomes.sort_by_key(|outcome| outcome.story_id());
        tracing::info!(computed = outcomes.len(), total, "Phase 2: COMPUTE complete");
        Ok(outcomes)
    }
}

/// Match and balance one story. Pure; shared by both commit modes.
pub(crate) fn compute_story(
    work: &StoryWork,
    themes: &[Theme],
    snapshot: &UsageSnapshot,
    matcher: &ThemeMatcher,
    balancer: &DiversityBalancer,
) -> ComputeOutcome {
    let usable: Vec<&str> = work
        .labels
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .collect();
    if usable.is_empty() {
        return ComputeOutcome::SkippedNoLabels(work.story_id);
    }

    let mut candidates: Vec<i64> = Vec::new();
    let mut unmatched = 0usize;
    for label in usable {
        match matcher.match_label(label, themes) {
            Some(theme_id) => {
                tracing::debug!(story_id = %work.story_id, label, theme_id, "Label matched");
                if !candidates.contains(&theme_id) {
                    candidates.push(theme_id);
                }
            }
            None => {
                unmatched += 1;
                match matcher.nearest_theme(label, themes) {
                    Some(miss) if miss.similarity >= NEAR_MISS_THRESHOLD => {
                        tracing::warn!(
                            story_id = %work.story_id,
                            label,
                            suggestion = %miss.theme_name,
                            similarity = miss.similarity,
                            "Unmatched label is close to an existing theme"
                        );
                    }
                    _ => {
                        tracing::debug!(story_id = %work.story_id, label, "Label unmatched");
                    }
                }
            }
        }
    }

    let theme_ids = balancer.balance(&candidates, themes, snapshot);
    let empty_after_balancing = theme_ids.is_empty();
    if empty_after_balancing {
        // Data-quality condition, not an error: downstream must be able
        // to tell "no themes found" apart from "not processed yet".
        tracing::warn!(story_id = %work.story_id, "Balancing produced no themes; writing empty set");
    }

    ComputeOutcome::Staged(StagedStory {
        story_id: work.story_id,
        theme_ids,
        source_labels: work.labels.clone(),
        unmatched_labels: unmatched,
        empty_after_balancing,
    })
}
