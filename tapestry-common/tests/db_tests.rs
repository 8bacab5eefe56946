//! Database schema and round-trip tests for tapestry-common

use tapestry_common::db::{self, assignments, checkpoints, labels, themes};
use tapestry_common::{Theme, ThemeAssignment};
use tempfile::TempDir;
use uuid::Uuid;

async fn create_test_db() -> (TempDir, sqlx::SqlitePool) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("test_tapestry.db");
    let pool = db::init_database_pool(&db_path).await.expect("init pool");
    (temp_dir, pool)
}

async fn table_names(pool: &sqlx::SqlitePool) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn init_creates_expected_tables() {
    let (_dir, pool) = create_test_db().await;
    let tables = table_names(&pool).await;
    for expected in ["themes", "theme_assignments", "story_labels", "run_checkpoints"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table '{}', have {:?}",
            expected,
            tables
        );
    }
}

#[tokio::test]
async fn active_themes_are_listed_in_id_order() {
    let (_dir, pool) = create_test_db().await;
    themes::save_theme(&pool, &Theme::new(3, "Identity")).await.unwrap();
    themes::save_theme(&pool, &Theme::new(1, "Resilience")).await.unwrap();
    let mut inactive = Theme::new(2, "Retired");
    inactive.active = false;
    themes::save_theme(&pool, &inactive).await.unwrap();

    let active = themes::list_active_themes(&pool).await.unwrap();
    assert_eq!(
        active.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![1, 3],
        "inactive themes excluded, remainder ascending by id"
    );
}

#[tokio::test]
async fn assignment_upsert_replaces_by_story_id() {
    let (_dir, pool) = create_test_db().await;
    let story_id = Uuid::new_v4();

    let first = ThemeAssignment::new(
        story_id,
        vec![2, 1],
        vec!["strength".to_string()],
        Uuid::new_v4(),
    );
    assignments::save_assignment(&pool, &first).await.unwrap();

    let second = ThemeAssignment::new(
        story_id,
        vec![4],
        vec!["strength".to_string()],
        Uuid::new_v4(),
    );
    assignments::save_assignment(&pool, &second).await.unwrap();

    let all = assignments::load_all_assignments(&pool).await.unwrap();
    assert_eq!(all.len(), 1, "upsert keyed by story_id must not duplicate");
    assert_eq!(all[0].theme_ids, vec![4]);
    assert_eq!(all[0].run_id, second.run_id);
}

#[tokio::test]
async fn assignment_round_trips_canonical_form() {
    let (_dir, pool) = create_test_db().await;
    let assignment = ThemeAssignment::new(
        Uuid::new_v4(),
        vec![9, 3, 3, 7],
        vec!["community support".to_string(), "xyz".to_string()],
        Uuid::new_v4(),
    );
    assignments::save_assignment(&pool, &assignment).await.unwrap();

    let loaded = assignments::load_assignment(&pool, assignment.story_id)
        .await
        .unwrap()
        .expect("assignment present");
    assert_eq!(loaded.theme_ids, vec![3, 7, 9]);
    assert_eq!(loaded.source_labels, assignment.source_labels);
    assert_eq!(loaded.run_id, assignment.run_id);
}

#[tokio::test]
async fn labels_keep_upstream_order() {
    let (_dir, pool) = create_test_db().await;
    let story_id = Uuid::new_v4();
    let raw = vec![
        "finding home".to_string(),
        "grief".to_string(),
        "grandmother's kitchen".to_string(),
    ];
    labels::replace_labels(&pool, story_id, &raw).await.unwrap();

    assert_eq!(labels::labels_for_story(&pool, story_id).await.unwrap(), raw);

    // Replacement is total, not additive
    let shorter = vec!["grief".to_string()];
    labels::replace_labels(&pool, story_id, &shorter).await.unwrap();
    assert_eq!(labels::labels_for_story(&pool, story_id).await.unwrap(), shorter);
}

#[tokio::test]
async fn checkpoint_advances_in_place() {
    let (_dir, pool) = create_test_db().await;
    let run_id = Uuid::new_v4();
    let first_story = Uuid::new_v4();
    let second_story = Uuid::new_v4();

    checkpoints::save_checkpoint(&pool, run_id, first_story, 1).await.unwrap();
    checkpoints::save_checkpoint(&pool, run_id, second_story, 2).await.unwrap();

    let cp = checkpoints::load_checkpoint(&pool, run_id)
        .await
        .unwrap()
        .expect("checkpoint present");
    assert_eq!(cp.last_story_id, second_story);
    assert_eq!(cp.committed, 2);

    assert!(checkpoints::load_checkpoint(&pool, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
