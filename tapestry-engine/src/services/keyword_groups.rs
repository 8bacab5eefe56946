//! Keyword group table for the third matching strategy
//!
//! **[TTE-MAT-040]** Maps sets of keywords to a theme-family key: when
//! any keyword of a group appears inside a label, the matcher selects
//! the active theme whose name contains the group's key. The table is
//! fixed and versioned; assignments produced under one revision can be
//! audited against it via the version number in every run report.
//!
//! Groups are scanned in declaration order and the first group that both
//! fires and resolves to an active theme wins, so ordering here is part
//! of the contract. Keep keys and keywords lowercase.

/// Revision of the mapping table below. Bump on any edit.
pub const GROUP_TABLE_VERSION: u32 = 3;

/// One keyword family
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    /// Substring looked up in active theme names (lowercase)
    pub key: &'static str,
    /// Trigger keywords looked up in labels (lowercase)
    pub keywords: &'static [&'static str],
}

/// Fixed keyword groups, in match priority order
pub const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        key: "resilience",
        keywords: &["strength", "perseverance", "survival", "overcoming", "endurance", "grit"],
    },
    KeywordGroup {
        key: "community",
        keywords: &["neighborhood", "neighbourhood", "togetherness", "solidarity", "mutual aid", "volunteers"],
    },
    KeywordGroup {
        key: "family",
        keywords: &["mother", "father", "parent", "sibling", "grandmother", "grandfather", "kinship"],
    },
    KeywordGroup {
        key: "loss",
        keywords: &["grief", "mourning", "bereavement", "passing", "absence"],
    },
    KeywordGroup {
        key: "migration",
        keywords: &["immigrant", "refugee", "displacement", "crossing", "exile", "new country"],
    },
    KeywordGroup {
        key: "identity",
        keywords: &["heritage", "roots", "culture", "ancestry", "belonging"],
    },
    KeywordGroup {
        key: "hope",
        keywords: &["optimism", "dream", "aspiration", "renewal", "fresh start"],
    },
    KeywordGroup {
        key: "love",
        keywords: &["romance", "marriage", "courtship", "devotion", "sweetheart"],
    },
    KeywordGroup {
        key: "work",
        keywords: &["labor", "labour", "career", "craft", "livelihood", "vocation", "factory"],
    },
    KeywordGroup {
        key: "faith",
        keywords: &["religion", "prayer", "spiritual", "worship", "congregation"],
    },
    KeywordGroup {
        key: "health",
        keywords: &["illness", "recovery", "healing", "diagnosis", "hospital"],
    },
    KeywordGroup {
        key: "education",
        keywords: &["school", "classroom", "teacher", "learning", "scholarship"],
    },
];
