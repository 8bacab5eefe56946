//! Theme matching cascade
//!
//! **[TTE-MAT-010]** Converts one raw label string into at most one
//! theme id using a deterministic cascade, first hit wins:
//!
//! 1. **Exact** - label equals a theme name (case-insensitive, trimmed)
//! 2. **Substring** - label inside a theme name or description, or a
//!    theme name inside the label; longest matched substring wins, ties
//!    broken by lowest theme id
//! 3. **Keyword group** - versioned keyword table maps label words to a
//!    theme family; lowest id on tie
//!
//! The cascade is pure: no I/O, no randomness, no clock. "No match" is
//! a normal `None`, never an error. Tie-breaks assume the theme slice is
//! in ascending id order, which `list_active_themes` guarantees.

use crate::services::keyword_groups::{KeywordGroup, KEYWORD_GROUPS};
use tapestry_common::Theme;

/// Jaro-Winkler similarity at or above this is reported as a near miss
pub const NEAR_MISS_THRESHOLD: f64 = 0.80;

/// Closest active theme for a label the cascade rejected
///
/// Diagnostic only; never feeds back into matching or balancing.
#[derive(Debug, Clone, PartialEq)]
pub struct NearMiss {
    pub theme_id: i64,
    pub theme_name: String,
    pub similarity: f64,
}

/// Theme matcher
///
/// **[TTE-MAT-010]** Stateless apart from the fixed keyword table.
pub struct ThemeMatcher {
    groups: &'static [KeywordGroup],
}

impl ThemeMatcher {
    pub fn new() -> Self {
        Self {
            groups: KEYWORD_GROUPS,
        }
    }

    /// Run the full cascade for one raw label
    ///
    /// # Arguments
    /// * `label` - raw label text from the upstream generator
    /// * `themes` - active themes, ascending by id
    pub fn match_label(&self, label: &str, themes: &[Theme]) -> Option<i64> {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        self.exact_match(&normalized, themes)
            .or_else(|| self.substring_match(&normalized, themes))
            .or_else(|| self.group_match(&normalized, themes))
    }

    /// Strategy 1: exact name equality **[TTE-MAT-020]**
    fn exact_match(&self, normalized: &str, themes: &[Theme]) -> Option<i64> {
        themes
            .iter()
            .find(|theme| theme.name.trim().to_lowercase() == normalized)
            .map(|theme| theme.id)
    }

    /// Strategy 2: substring containment **[TTE-MAT-030]**
    ///
    /// The matched-substring length is the label length when the label
    /// sits inside a name or description, and the name length when a
    /// name sits inside the label. Longest wins; ties go to lowest id.
    fn substring_match(&self, normalized: &str, themes: &[Theme]) -> Option<i64> {
        let mut best: Option<(usize, i64)> = None;

        for theme in themes {
            let name = theme.name.trim().to_lowercase();
            let description = theme.description.trim().to_lowercase();

            let mut matched = 0usize;
            if !name.is_empty() && name.contains(normalized) {
                matched = matched.max(normalized.len());
            }
            if !description.is_empty() && description.contains(normalized) {
                matched = matched.max(normalized.len());
            }
            if !name.is_empty() && normalized.contains(&name) {
                matched = matched.max(name.len());
            }
            if matched == 0 {
                continue;
            }

            let better = match best {
                None => true,
                Some((best_len, best_id)) => {
                    matched > best_len || (matched == best_len && theme.id < best_id)
                }
            };
            if better {
                best = Some((matched, theme.id));
            }
        }

        best.map(|(_, id)| id)
    }

    /// Strategy 3: keyword group lookup **[TTE-MAT-040]**
    ///
    /// Groups are scanned in table order. A group whose key resolves to
    /// no active theme is skipped rather than swallowing the label.
    fn group_match(&self, normalized: &str, themes: &[Theme]) -> Option<i64> {
        for group in self.groups {
            if !group.keywords.iter().any(|kw| normalized.contains(kw)) {
                continue;
            }

            let id = themes
                .iter()
                .filter(|theme| theme.name.to_lowercase().contains(group.key))
                .map(|theme| theme.id)
                .min();
            if let Some(id) = id {
                return Some(id);
            }
        }
        None
    }

    /// Closest theme name by Jaro-Winkler, for unmatched-label logging
    ///
    /// Returns the best-scoring theme regardless of threshold; the
    /// caller decides whether it is close enough to surface.
    pub fn nearest_theme(&self, label: &str, themes: &[Theme]) -> Option<NearMiss> {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<NearMiss> = None;
        for theme in themes {
            let similarity = strsim::jaro_winkler(&normalized, &theme.name.to_lowercase());
            let better = match &best {
                None => true,
                Some(b) => similarity > b.similarity,
            };
            if better {
                best = Some(NearMiss {
                    theme_id: theme.id,
                    theme_name: theme.name.clone(),
                    similarity,
                });
            }
        }
        best
    }
}

impl Default for ThemeMatcher {
    fn default() -> Self {
        Self::new()
    }
}
