//! Raw label storage
//!
//! The upstream label generator writes its output here; the engine reads
//! it per story. Labels keep their upstream emission order via the
//! `position` column.

use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Replace all raw labels for a story (generator-side write)
pub async fn replace_labels(pool: &SqlitePool, story_id: Uuid, labels: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM story_labels WHERE story_id = ?")
        .bind(story_id.to_string())
        .execute(pool)
        .await?;

    for (position, label) in labels.iter().enumerate() {
        sqlx::query(
            "INSERT INTO story_labels (story_id, label, position) VALUES (?, ?, ?)",
        )
        .bind(story_id.to_string())
        .bind(label)
        .bind(position as i64)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Raw labels for one story in upstream order (may be empty)
pub async fn labels_for_story(pool: &SqlitePool, story_id: Uuid) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT label FROM story_labels WHERE story_id = ? ORDER BY position",
    )
    .bind(story_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("label")).collect())
}

/// Every story the generator has produced labels for, ascending
pub async fn stories_with_labels(pool: &SqlitePool) -> Result<Vec<Uuid>> {
    let rows = sqlx::query("SELECT DISTINCT story_id FROM story_labels ORDER BY story_id")
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            let id: String = row.get("story_id");
            Uuid::parse_str(&id)
                .map_err(|e| Error::Internal(format!("bad story_id '{}': {}", id, e)))
        })
        .collect()
}
