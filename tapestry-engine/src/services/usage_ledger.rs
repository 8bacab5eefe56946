//! Usage ledger and snapshots
//!
//! **[TTE-LED-010]** Tracks how many persisted assignments reference
//! each theme. A snapshot is taken once at run start and stays frozen
//! through the compute phase; the ledger itself advances only as the
//! commit phase lands each record. The frozen snapshot is what makes
//! parallel compute safe: no record ever observes counts written
//! mid-run.

use std::collections::HashMap;
use tapestry_common::ThemeAssignment;

/// Point-in-time theme usage counts, immutable once taken
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    counts: HashMap<i64, u64>,
}

impl UsageSnapshot {
    pub fn from_counts(counts: HashMap<i64, u64>) -> Self {
        Self { counts }
    }

    /// Assignments referencing this theme at snapshot time
    pub fn count(&self, theme_id: i64) -> u64 {
        self.counts.get(&theme_id).copied().unwrap_or(0)
    }

    /// Whether the theme sits above the overuse threshold (strict)
    pub fn is_overused(&self, theme_id: i64, threshold: u64) -> bool {
        self.count(theme_id) > threshold
    }
}

/// Mutable usage counters, read-many during a run, written only at commit
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    counts: HashMap<i64, u64>,
}

impl UsageLedger {
    /// Rebuild counters from every persisted assignment
    pub fn from_assignments(assignments: &[ThemeAssignment]) -> Self {
        let mut counts: HashMap<i64, u64> = HashMap::new();
        for assignment in assignments {
            for &theme_id in &assignment.theme_ids {
                *counts.entry(theme_id).or_insert(0) += 1;
            }
        }
        Self { counts }
    }

    /// Take a frozen snapshot of the current counters
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            counts: self.counts.clone(),
        }
    }

    /// Advance counters for one committed record
    ///
    /// Called only after the record's assignment write succeeded, so a
    /// failed write never inflates the ledger.
    pub fn commit(&mut self, theme_ids: &[i64]) {
        for &theme_id in theme_ids {
            *self.counts.entry(theme_id).or_insert(0) += 1;
        }
    }
}
