//! Per-run statistics
//!
//! **[TTE-RPT-010]** The run report is the authoritative record of what
//! a run did; nothing may be visible only in logs. It accumulates as the
//! commit phase lands records and serializes to JSON for dashboards.

use crate::services::keyword_groups::GROUP_TABLE_VERSION;
use crate::types::{CommitMode, RunMode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome summary for one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub commit_mode: CommitMode,
    /// Keyword table revision in force during this run
    pub group_table_version: u32,
    /// Stories whose assignment committed successfully
    pub processed: usize,
    /// Stories with zero usable labels; nothing written
    pub skipped_no_labels: usize,
    /// Stories whose assignment write failed after retries
    pub failed: usize,
    /// Committed stories that ended with an empty theme set
    pub empty_after_balancing: usize,
    /// Labels across committed stories the cascade could not place
    pub unmatched_labels: usize,
    /// True when the run stopped early on a cancellation request
    pub cancelled: bool,
    /// Committed assignment slots per theme for this run
    pub category_distribution: BTreeMap<i64, u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new(run_id: Uuid, mode: RunMode, commit_mode: CommitMode) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            mode,
            commit_mode,
            group_table_version: GROUP_TABLE_VERSION,
            processed: 0,
            skipped_no_labels: 0,
            failed: 0,
            empty_after_balancing: 0,
            unmatched_labels: 0,
            cancelled: false,
            category_distribution: BTreeMap::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Account for one committed story
    pub fn record_commit(&mut self, theme_ids: &[i64]) {
        self.processed += 1;
        for &theme_id in theme_ids {
            *self.category_distribution.entry(theme_id).or_insert(0) += 1;
        }
    }

    /// Stamp the end of the run
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Total assignment slots committed in this run
    pub fn total_slots(&self) -> u64 {
        self.category_distribution.values().sum()
    }

    /// Largest single theme's share of this run's assignment slots
    ///
    /// The concentration figure the balancer exists to keep down; the
    /// pipeline logs a warning when it exceeds 60%.
    pub fn max_share(&self) -> Option<(i64, f64)> {
        let total = self.total_slots();
        if total == 0 {
            return None;
        }
        self.category_distribution
            .iter()
            .max_by_key(|&(&theme_id, &count)| (count, std::cmp::Reverse(theme_id)))
            .map(|(&theme_id, &count)| (theme_id, count as f64 / total as f64))
    }

    pub fn display_string(&self) -> String {
        format!(
            "run {} ({}, {} commit): {} processed, {} skipped (no labels), {} failed, {} unmatched labels, {} themes in use{}",
            self.run_id,
            self.mode,
            self.commit_mode,
            self.processed,
            self.skipped_no_labels,
            self.failed,
            self.unmatched_labels,
            self.category_distribution.len(),
            if self.cancelled { ", cancelled" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport::new(Uuid::new_v4(), RunMode::Fresh, CommitMode::Batch)
    }

    /// **[TC-U-RPT-010-01]** Commits accumulate into the distribution
    #[test]
    fn tc_u_rpt_010_01_record_commit_accumulates() {
        let mut r = report();
        r.record_commit(&[1, 2]);
        r.record_commit(&[1]);
        assert_eq!(r.processed, 2);
        assert_eq!(r.category_distribution.get(&1), Some(&2));
        assert_eq!(r.category_distribution.get(&2), Some(&1));
        assert_eq!(r.total_slots(), 3);
    }

    /// **[TC-U-RPT-010-02]** Max share picks the dominant theme,
    /// lowest id on tie
    #[test]
    fn tc_u_rpt_010_02_max_share() {
        let mut r = report();
        assert_eq!(r.max_share(), None, "no commits, no share");
        r.record_commit(&[1, 2]);
        r.record_commit(&[2]);
        r.record_commit(&[3]);
        let (theme_id, share) = r.max_share().unwrap();
        assert_eq!(theme_id, 2);
        assert!((share - 0.5).abs() < 1e-9);

        let mut tied = report();
        tied.record_commit(&[4, 9]);
        assert_eq!(tied.max_share().unwrap().0, 4, "tie breaks to lowest id");
    }

    /// **[TC-U-RPT-020-01]** Display string carries every counter
    #[test]
    fn tc_u_rpt_020_01_display_string() {
        let mut r = report();
        r.record_commit(&[1]);
        r.skipped_no_labels = 2;
        r.failed = 1;
        let s = r.display_string();
        assert!(s.contains("1 processed"), "{}", s);
        assert!(s.contains("2 skipped"), "{}", s);
        assert!(s.contains("1 failed"), "{}", s);
        assert!(!s.contains("cancelled"), "{}", s);
    }

    /// **[TC-U-RPT-020-02]** Report serializes for dashboards
    #[test]
    fn tc_u_rpt_020_02_serializes_to_json() {
        let mut r = report();
        r.record_commit(&[1, 3]);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"processed\":1"), "{}", json);
        assert!(json.contains("\"category_distribution\""), "{}", json);
    }
}
