//! Diversity balancing
//!
//! **[TTE-BAL-010]** Takes the matched candidate themes for one story,
//! deduplicates them, caps the set size, and backfills under-represented
//! themes until the diversity floor is met. Backfill order is fully
//! deterministic: overused themes last, then ascending snapshot count,
//! then ascending id. Matched candidates are never dropped for overuse;
//! the balancer only shapes what gets added.
//!
//! Pure computation: no I/O, no randomness.

use crate::services::usage_ledger::UsageSnapshot;
use std::collections::HashSet;
use tapestry_common::Theme;

/// Diversity balancer
///
/// One instance per run; parameters come from [`crate::EngineParams`],
/// which guarantees `min_diversity <= max_categories`.
#[derive(Debug, Clone, Copy)]
pub struct DiversityBalancer {
    pub min_diversity: usize,
    pub max_categories: usize,
    pub overuse_threshold: u64,
}

impl DiversityBalancer {
    /// Produce the final theme set for one story
    ///
    /// **[TTE-BAL-020]** Steps, in order:
    /// 1. Dedup candidates, keeping matcher emission order, and drop
    ///    anything not in the active taxonomy; cap at `max_categories`.
    /// 2. Below the diversity floor, backfill active themes ordered by
    ///    `(overused, snapshot count, id)` ascending until the floor is
    ///    met or the taxonomy is exhausted.
    ///
    /// Sorting overused themes to the back rather than excluding them
    /// keeps them available as a last resort, so a story is never left
    /// empty while any active theme exists (**[TTE-BAL-030]**).
    pub fn balance(
        &self,
        candidates: &[i64],
        themes: &[Theme],
        snapshot: &UsageSnapshot,
    ) -> Vec<i64> {
        let active: HashSet<i64> = themes.iter().map(|theme| theme.id).collect();

        let mut selected: Vec<i64> = Vec::new();
        for &id in candidates {
            if selected.len() >= self.max_categories {
                break;
            }
            if active.contains(&id) && !selected.contains(&id) {
                selected.push(id);
            }
        }

        // Floor cannot exceed the cap, whatever the caller passed in
        let floor = self.min_diversity.min(self.max_categories);
        if selected.len() < floor {
            let mut backfill: Vec<&Theme> = themes
                .iter()
                .filter(|theme| !selected.contains(&theme.id))
                .collect();
            backfill.sort_by_key(|theme| {
                (
                    snapshot.is_overused(theme.id, self.overuse_threshold),
                    snapshot.count(theme.id),
                    theme.id,
                )
            });

            for theme in backfill {
                if selected.len() >= floor {
                    break;
                }
                selected.push(theme.id);
            }
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn balancer() -> DiversityBalancer {
        DiversityBalancer {
            min_diversity: 2,
            max_categories: 5,
            overuse_threshold: 10,
        }
    }

    fn themes(ids: &[i64]) -> Vec<Theme> {
        ids.iter().map(|&id| Theme::new(id, format!("Theme {}", id))).collect()
    }

    fn snapshot(counts: &[(i64, u64)]) -> UsageSnapshot {
        UsageSnapshot::from_counts(counts.iter().copied().collect::<HashMap<_, _>>())
    }

    /// **[TC-U-BAL-020-01]** No candidates: backfill picks by
    /// (count asc, id asc)
    #[test]
    fn tc_u_bal_020_01_backfill_by_count_then_id() {
        let result = balancer().balance(
            &[],
            &themes(&[1, 2, 3]),
            &snapshot(&[(1, 3), (2, 1), (3, 9)]),
        );
        assert_eq!(result, vec![2, 1]);
    }

    /// **[TC-U-BAL-030-01]** A single overused theme is still assigned;
    /// non-empty output beats anti-concentration
    #[test]
    fn tc_u_bal_030_01_sole_overused_theme_kept() {
        let result = balancer().balance(&[], &themes(&[1]), &snapshot(&[(1, 11)]));
        assert_eq!(result, vec![1]);
    }

    /// **[TC-U-BAL-020-02]** Overused themes are deprioritized but not
    /// banned from backfill
    #[test]
    fn tc_u_bal_020_02_overused_sorted_last_not_banned() {
        // Theme 1 is far past the threshold; 2 and 3 are not.
        let result = balancer().balance(
            &[],
            &themes(&[1, 2, 3]),
            &snapshot(&[(1, 20), (2, 5), (3, 0)]),
        );
        assert_eq!(result, vec![3, 2]);

        // All overused: lowest count still wins, then id.
        let result = balancer().balance(
            &[],
            &themes(&[1, 2]),
            &snapshot(&[(1, 20), (2, 15)]),
        );
        assert_eq!(result, vec![2, 1]);
    }

    /// **[TC-U-BAL-010-01]** Candidates are deduplicated and capped in
    /// emission order
    #[test]
    fn tc_u_bal_010_01_dedup_and_cap() {
        let result = balancer().balance(
            &[4, 2, 4, 1, 3, 5, 6],
            &themes(&[1, 2, 3, 4, 5, 6]),
            &snapshot(&[]),
        );
        assert_eq!(result, vec![4, 2, 1, 3, 5], "first five distinct, emission order");
    }

    /// **[TC-U-BAL-010-02]** A matched candidate above the overuse
    /// threshold is never dropped
    #[test]
    fn tc_u_bal_010_02_matched_overused_candidate_kept() {
        let result = balancer().balance(
            &[3],
            &themes(&[1, 2, 3]),
            &snapshot(&[(3, 50)]),
        );
        assert!(result.contains(&3), "matched theme survives any usage count");
        // Backfill tops up the floor from the least-used remainder.
        assert_eq!(result, vec![3, 1]);
    }

    /// **[TC-U-BAL-010-03]** Candidates outside the active taxonomy are
    /// discarded before balancing
    #[test]
    fn tc_u_bal_010_03_unknown_candidates_discarded() {
        let result = balancer().balance(&[99], &themes(&[1, 2]), &snapshot(&[]));
        assert_eq!(result, vec![1, 2], "unknown id contributes nothing");
    }

    /// **[TC-U-BAL-020-03]** Floor clamps to the taxonomy size
    #[test]
    fn tc_u_bal_020_03_taxonomy_exhaustion() {
        let result = balancer().balance(&[], &themes(&[7]), &snapshot(&[]));
        assert_eq!(result, vec![7]);
    }

    /// **[TC-U-BAL-020-04]** Zero floor with no candidates is a valid
    /// empty result
    #[test]
    fn tc_u_bal_020_04_zero_floor_allows_empty() {
        let b = DiversityBalancer {
            min_diversity: 0,
            max_categories: 5,
            overuse_threshold: 10,
        };
        assert!(b.balance(&[], &themes(&[1, 2]), &snapshot(&[])).is_empty());
    }

    /// **[TC-U-BAL-040-01]** Balancing is deterministic for fixed inputs
    #[test]
    fn tc_u_bal_040_01_deterministic() {
        let t = themes(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let s = snapshot(&[(1, 4), (2, 4), (3, 1), (4, 12), (5, 0)]);
        let first = balancer().balance(&[4], &t, &s);
        for _ in 0..10 {
            assert_eq!(balancer().balance(&[4], &t, &s), first);
        }
    }
}
