//! SQLite-backed collaborator implementations
//!
//! Thin adapters from the collaborator traits in [`crate::types`] onto
//! the shared query layer in `tapestry_common::db`. All three share the
//! same pool; cloning an `SqlitePool` is cheap.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tapestry_common::db::{assignments, checkpoints, labels, themes};
use tapestry_common::{Result, Theme, ThemeAssignment};
use uuid::Uuid;

use crate::types::{AssignmentStore, LabelSource, TaxonomyStore};

/// Read-only view over the `themes` table
pub struct SqliteTaxonomyStore {
    pool: SqlitePool,
}

impl SqliteTaxonomyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaxonomyStore for SqliteTaxonomyStore {
    async fn list_active_themes(&self) -> Result<Vec<Theme>> {
        themes::list_active_themes(&self.pool).await
    }
}

/// Upstream generator output read from the `story_labels` table
pub struct SqliteLabelSource {
    pool: SqlitePool,
}

impl SqliteLabelSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelSource for SqliteLabelSource {
    async fn story_ids(&self) -> Result<Vec<Uuid>> {
        labels::stories_with_labels(&self.pool).await
    }

    async fn raw_labels(&self, story_id: Uuid) -> Result<Vec<String>> {
        labels::labels_for_story(&self.pool, story_id).await
    }
}

/// Assignment and checkpoint persistence
pub struct SqliteAssignmentStore {
    pool: SqlitePool,
}

impl SqliteAssignmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for SqliteAssignmentStore {
    async fn write_assignment(&self, assignment: &ThemeAssignment) -> Result<()> {
        assignments::save_assignment(&self.pool, assignment).await
    }

    async fn load_all_assignments(&self) -> Result<Vec<ThemeAssignment>> {
        assignments::load_all_assignments(&self.pool).await
    }

    async fn save_checkpoint(
        &self,
        run_id: Uuid,
        last_story_id: Uuid,
        committed: i64,
    ) -> Result<()> {
        checkpoints::save_checkpoint(&self.pool, run_id, last_story_id, committed).await
    }
}
