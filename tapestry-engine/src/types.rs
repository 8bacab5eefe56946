//! Collaborator traits and run-level enums
//!
//! **[TTE-ARCH-010]** The pipeline never touches the database directly;
//! it is generic over three collaborator traits so the pure core can be
//! exercised against in-memory fakes. SQLite-backed implementations live
//! in [`crate::stores`].

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Serialize;
use tapestry_common::{Result, Theme, ThemeAssignment};
use uuid::Uuid;

/// How a run selects its work list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Assign stories that have raw labels but no assignment yet
    Fresh,
    /// Recompute every existing assignment from its stored source
    /// labels (taxonomy or policy changed)
    Reassign,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Fresh => write!(f, "fresh"),
            RunMode::Reassign => write!(f, "reassign"),
        }
    }
}

/// When assignment writes and ledger updates are applied
///
/// **[TTE-WF-040]** Batch mode freezes the usage snapshot for the whole
/// run, which is what makes parallel compute safe. Incremental mode
/// advances the ledger between records and therefore forces sequential
/// compute; selecting it is an explicit operator choice, never a silent
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Compute the whole batch against one frozen snapshot, then commit
    Batch,
    /// Commit after each record; later records see updated counts
    Incremental,
}

impl std::fmt::Display for CommitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitMode::Batch => write!(f, "batch"),
            CommitMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Read-only view of the curated theme taxonomy
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Active themes in a stable total order (ascending id)
    async fn list_active_themes(&self) -> Result<Vec<Theme>>;
}

/// Upstream label generator output, per story
#[async_trait]
pub trait LabelSource: Send + Sync {
    /// Every story the generator has produced labels for
    async fn story_ids(&self) -> Result<Vec<Uuid>>;

    /// Raw labels for one story in upstream order (may be empty)
    async fn raw_labels(&self, story_id: Uuid) -> Result<Vec<String>>;
}

/// Persistence collaborator for assignments and run checkpoints
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Idempotent upsert keyed by `story_id`
    async fn write_assignment(&self, assignment: &ThemeAssignment) -> Result<()>;

    /// Every persisted assignment (usage snapshot + reassign work list)
    async fn load_all_assignments(&self) -> Result<Vec<ThemeAssignment>>;

    /// Record the last fully-committed story for safe resume
    async fn save_checkpoint(&self, run_id: Uuid, last_story_id: Uuid, committed: i64)
        -> Result<()>;
}
