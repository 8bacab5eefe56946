//! Test helper utilities
//!
//! Scratch-database builders, taxonomy/label seeders, and in-memory
//! collaborator fakes for exercising the pipeline without SQLite.
#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;
use tapestry_common::db::{self, labels, themes};
use tapestry_common::{Error, Result, Theme, ThemeAssignment};
use tapestry_engine::config::EngineParams;
use tapestry_engine::services::AssignmentPipeline;
use tapestry_engine::stores::{SqliteAssignmentStore, SqliteLabelSource, SqliteTaxonomyStore};
use tapestry_engine::types::{AssignmentStore, LabelSource, TaxonomyStore};
use tempfile::TempDir;
use uuid::Uuid;

pub type SqlitePipeline =
    AssignmentPipeline<SqliteTaxonomyStore, SqliteLabelSource, SqliteAssignmentStore>;

/// Create a temporary database; keep the TempDir alive for the test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test_tapestry.db");
    let pool = db::init_database_pool(&db_path).await.expect("init pool");
    (temp_dir, pool)
}

/// Seed `(id, name, description)` rows into the themes table
pub async fn seed_themes(pool: &SqlitePool, entries: &[(i64, &str, &str)]) {
    for &(id, name, description) in entries {
        themes::save_theme(pool, &Theme::with_description(id, name, description))
            .await
            .expect("seed theme");
    }
}

/// Seed raw labels for one story, returning its id
pub async fn seed_story(pool: &SqlitePool, raw: &[&str]) -> Uuid {
    let story_id = Uuid::new_v4();
    let raw: Vec<String> = raw.iter().map(|l| l.to_string()).collect();
    labels::replace_labels(pool, story_id, &raw).await.expect("seed labels");
    story_id
}

/// Seed a pre-existing assignment to establish usage counts
pub async fn seed_assignment(pool: &SqlitePool, theme_ids: Vec<i64>) -> Uuid {
    let story_id = Uuid::new_v4();
    let assignment = ThemeAssignment::new(story_id, theme_ids, vec![], Uuid::new_v4());
    db::assignments::save_assignment(pool, &assignment)
        .await
        .expect("seed assignment");
    story_id
}

/// Pipeline wired to the SQLite-backed stores
pub fn sqlite_pipeline(pool: &SqlitePool, params: EngineParams) -> SqlitePipeline {
    AssignmentPipeline::new(
        SqliteTaxonomyStore::new(pool.clone()),
        SqliteLabelSource::new(pool.clone()),
        SqliteAssignmentStore::new(pool.clone()),
        params,
    )
}

// ---------------------------------------------------------------------------
// In-memory collaborator fakes
// ---------------------------------------------------------------------------

/// Taxonomy served from a fixed vector
pub struct FakeTaxonomy(pub Vec<Theme>);

#[async_trait]
impl TaxonomyStore for FakeTaxonomy {
    async fn list_active_themes(&self) -> Result<Vec<Theme>> {
        Ok(self.0.clone())
    }
}

/// Taxonomy store whose backend is down
pub struct UnreachableTaxonomy;

#[async_trait]
impl TaxonomyStore for UnreachableTaxonomy {
    async fn list_active_themes(&self) -> Result<Vec<Theme>> {
        Err(Error::Internal("connection refused".to_string()))
    }
}

/// Label source served from a fixed map
pub struct FakeLabels(pub HashMap<Uuid, Vec<String>>);

impl FakeLabels {
    pub fn single(story_id: Uuid, labels: &[&str]) -> Self {
        Self(HashMap::from([(
            story_id,
            labels.iter().map(|l| l.to_string()).collect(),
        )]))
    }
}

#[async_trait]
impl LabelSource for FakeLabels {
    async fn story_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.0.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn raw_labels(&self, story_id: Uuid) -> Result<Vec<String>> {
        Ok(self.0.get(&story_id).cloned().unwrap_or_default())
    }
}

/// In-memory assignment store with per-story write-failure injection
#[derive(Default)]
pub struct InMemoryStore {
    pub assignments: Mutex<HashMap<Uuid, ThemeAssignment>>,
    pub checkpoints: Mutex<HashMap<Uuid, (Uuid, i64)>>,
    /// story_id -> failures still to inject (`u32::MAX` = always fail)
    pub write_failures: Mutex<HashMap<Uuid, u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: Vec<ThemeAssignment>) -> Self {
        let store = Self::default();
        {
            let mut map = store.assignments.lock().unwrap();
            for assignment in assignments {
                map.insert(assignment.story_id, assignment);
            }
        }
        store
    }

    /// Make the next `count` writes for `story_id` fail
    pub fn fail_writes(&self, story_id: Uuid, count: u32) {
        self.write_failures.lock().unwrap().insert(story_id, count);
    }

    pub fn assignment(&self, story_id: Uuid) -> Option<ThemeAssignment> {
        self.assignments.lock().unwrap().get(&story_id).cloned()
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.lock().unwrap().len()
    }
}

#[async_trait]
impl AssignmentStore for &InMemoryStore {
    async fn write_assignment(&self, assignment: &ThemeAssignment) -> Result<()> {
        {
            let mut failures = self.write_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&assignment.story_id) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(Error::Internal("injected write failure".to_string()));
                }
            }
        }
        self.assignments
            .lock()
            .unwrap()
            .insert(assignment.story_id, assignment.clone());
        Ok(())
    }

    async fn load_all_assignments(&self) -> Result<Vec<ThemeAssignment>> {
        let mut all: Vec<ThemeAssignment> =
            self.assignments.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|a| a.story_id);
        Ok(all)
    }

    async fn save_checkpoint(
        &self,
        run_id: Uuid,
        last_story_id: Uuid,
        committed: i64,
    ) -> Result<()> {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(run_id, (last_story_id, committed));
        Ok(())
    }
}

/// Stock engine parameters used across tests
pub fn default_params() -> EngineParams {
    EngineParams::default()
}
