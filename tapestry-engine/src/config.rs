//! Engine parameter resolution
//!
//! **[TTE-CFG-010]** Balancing thresholds are configuration, not code:
//! resolution priority is CLI argument (clap also maps environment
//! variables onto these) > TOML config file > compiled default. The
//! resolved set is validated once here so the pipeline can trust it.

use crate::types::CommitMode;
use tapestry_common::config::EngineSection;
use tapestry_common::{Error, Result};

pub const DEFAULT_MIN_DIVERSITY: usize = 2;
pub const DEFAULT_MAX_CATEGORIES: usize = 5;
pub const DEFAULT_OVERUSE_THRESHOLD: u64 = 10;

/// Engine parameter overrides collected from the CLI layer
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOverrides {
    pub min_diversity: Option<usize>,
    pub max_categories: Option<usize>,
    pub overuse_threshold: Option<u64>,
    pub commit_mode: Option<CommitMode>,
    pub parallelism: Option<usize>,
}

/// Validated per-run engine parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    /// Minimum distinct themes per story when the taxonomy allows it
    pub min_diversity: usize,
    /// Hard cap on themes per story
    pub max_categories: usize,
    /// Usage count above which a theme is deprioritized in backfill
    pub overuse_threshold: u64,
    pub commit_mode: CommitMode,
    /// Compute-phase worker tasks (1 = sequential)
    pub parallelism: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_diversity: DEFAULT_MIN_DIVERSITY,
            max_categories: DEFAULT_MAX_CATEGORIES,
            overuse_threshold: DEFAULT_OVERUSE_THRESHOLD,
            commit_mode: CommitMode::Batch,
            parallelism: 1,
        }
    }
}

impl EngineParams {
    /// Resolve and validate parameters from all configuration tiers
    pub fn resolve(cli: &EngineOverrides, toml: Option<&EngineSection>) -> Result<Self> {
        let min_diversity = cli
            .min_diversity
            .or(toml.and_then(|t| t.min_diversity))
            .unwrap_or(DEFAULT_MIN_DIVERSITY);
        let max_categories = cli
            .max_categories
            .or(toml.and_then(|t| t.max_categories))
            .unwrap_or(DEFAULT_MAX_CATEGORIES);
        let overuse_threshold = cli
            .overuse_threshold
            .or(toml.and_then(|t| t.overuse_threshold))
            .unwrap_or(DEFAULT_OVERUSE_THRESHOLD);

        let commit_mode = match cli.commit_mode {
            Some(mode) => mode,
            None => match toml.and_then(|t| t.commit_mode.as_deref()) {
                Some("batch") => CommitMode::Batch,
                Some("incremental") => CommitMode::Incremental,
                Some(other) => {
                    return Err(Error::Config(format!(
                        "unknown commit_mode '{}' (expected 'batch' or 'incremental')",
                        other
                    )))
                }
                None => CommitMode::Batch,
            },
        };

        let mut parallelism = cli
            .parallelism
            .or(toml.and_then(|t| t.parallelism))
            .unwrap_or(1);

        if max_categories == 0 {
            return Err(Error::Config("max_categories must be at least 1".to_string()));
        }
        if min_diversity > max_categories {
            return Err(Error::Config(format!(
                "min_diversity ({}) must not exceed max_categories ({})",
                min_diversity, max_categories
            )));
        }
        if parallelism == 0 {
            return Err(Error::Config("parallelism must be at least 1".to_string()));
        }

        // **[TTE-WF-040]** Incremental commit needs records to observe
        // each other's counts, so compute must be sequential. The
        // downgrade is logged rather than silent.
        if commit_mode == CommitMode::Incremental && parallelism > 1 {
            tracing::warn!(
                requested = parallelism,
                "incremental commit mode forces sequential compute; parallelism reduced to 1"
            );
            parallelism = 1;
        }

        Ok(Self {
            min_diversity,
            max_categories,
            overuse_threshold,
            commit_mode,
            parallelism,
        })
    }
}
