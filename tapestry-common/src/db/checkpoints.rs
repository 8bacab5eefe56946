//! Run checkpoint persistence
//!
//! Advanced after every committed story so an interrupted run can resume
//! without reprocessing already-committed records.

use crate::{Error, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Checkpoint row for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCheckpoint {
    pub run_id: Uuid,
    /// Last story whose assignment fully committed
    pub last_story_id: Uuid,
    /// Stories committed so far in this run
    pub committed: i64,
}

/// Advance (upsert) the checkpoint for a run
pub async fn save_checkpoint(
    pool: &SqlitePool,
    run_id: Uuid,
    last_story_id: Uuid,
    committed: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO run_checkpoints (run_id, last_story_id, committed, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(run_id) DO UPDATE SET
            last_story_id = excluded.last_story_id,
            committed = excluded.committed,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(run_id.to_string())
    .bind(last_story_id.to_string())
    .bind(committed)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the checkpoint for a run, if one was ever written
pub async fn load_checkpoint(pool: &SqlitePool, run_id: Uuid) -> Result<Option<RunCheckpoint>> {
    let row = sqlx::query(
        "SELECT run_id, last_story_id, committed FROM run_checkpoints WHERE run_id = ?",
    )
    .bind(run_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let run_id: String = row.get("run_id");
        let last_story_id: String = row.get("last_story_id");
        Ok(RunCheckpoint {
            run_id: Uuid::parse_str(&run_id)
                .map_err(|e| Error::Internal(format!("bad run_id '{}': {}", run_id, e)))?,
            last_story_id: Uuid::parse_str(&last_story_id).map_err(|e| {
                Error::Internal(format!("bad last_story_id '{}': {}", last_story_id, e))
            })?,
            committed: row.get("committed"),
        })
    })
    .transpose()
}
