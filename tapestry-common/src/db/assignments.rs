//! Theme assignment persistence
//!
//! One row per story, written all-or-nothing. The upsert is keyed by
//! `story_id` so re-assignment replaces rather than duplicates.

use crate::{Error, Result, ThemeAssignment};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Save (upsert) one story's assignment
pub async fn save_assignment(pool: &SqlitePool, assignment: &ThemeAssignment) -> Result<()> {
    let theme_ids = serde_json::to_string(&assignment.theme_ids)?;
    let source_labels = serde_json::to_string(&assignment.source_labels)?;

    sqlx::query(
        r#"
        INSERT INTO theme_assignments (
            story_id, theme_ids, source_labels, run_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(story_id) DO UPDATE SET
            theme_ids = excluded.theme_ids,
            source_labels = excluded.source_labels,
            run_id = excluded.run_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(assignment.story_id.to_string())
    .bind(theme_ids)
    .bind(source_labels)
    .bind(assignment.run_id.to_string())
    .bind(assignment.created_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one story's assignment, if any
pub async fn load_assignment(pool: &SqlitePool, story_id: Uuid) -> Result<Option<ThemeAssignment>> {
    let row = sqlx::query(
        r#"
        SELECT story_id, theme_ids, source_labels, run_id, created_at
        FROM theme_assignments
        WHERE story_id = ?
        "#,
    )
    .bind(story_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(assignment_from_row).transpose()
}

/// Load every persisted assignment, ordered by story id
///
/// Used to compute a usage snapshot at run start and to build the
/// re-assignment work list.
pub async fn load_all_assignments(pool: &SqlitePool) -> Result<Vec<ThemeAssignment>> {
    let rows = sqlx::query(
        r#"
        SELECT story_id, theme_ids, source_labels, run_id, created_at
        FROM theme_assignments
        ORDER BY story_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(assignment_from_row).collect()
}

fn assignment_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ThemeAssignment> {
    let story_id: String = row.get("story_id");
    let run_id: String = row.get("run_id");
    let theme_ids: String = row.get("theme_ids");
    let source_labels: String = row.get("source_labels");
    let created_at: String = row.get("created_at");

    Ok(ThemeAssignment {
        story_id: parse_uuid("story_id", &story_id)?,
        theme_ids: serde_json::from_str(&theme_ids)?,
        source_labels: serde_json::from_str(&source_labels)?,
        run_id: parse_uuid("run_id", &run_id)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Internal(format!("bad created_at '{}': {}", created_at, e)))?
            .with_timezone(&Utc),
    })
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("bad {} '{}': {}", column, value, e)))
}
