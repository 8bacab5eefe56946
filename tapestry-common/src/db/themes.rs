//! Theme taxonomy queries
//!
//! The taxonomy service owns writes to the `themes` table; the theme
//! engine only calls [`list_active_themes`]. `save_theme` exists for the
//! owning service and for test seeding.

use crate::{Result, Theme};
use sqlx::{Row, SqlitePool};

/// List all active themes in a stable total order (ascending id)
///
/// Every downstream tie-break in matching and balancing depends on this
/// ordering being stable.
pub async fn list_active_themes(pool: &SqlitePool) -> Result<Vec<Theme>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, group_name, description, active
        FROM themes
        WHERE active = 1
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Theme {
            id: row.get("id"),
            name: row.get("name"),
            group_name: row.get("group_name"),
            description: row.get("description"),
            active: row.get::<i64, _>("active") != 0,
        })
        .collect())
}

/// Insert or update a theme (taxonomy service / test seeding only)
pub async fn save_theme(pool: &SqlitePool, theme: &Theme) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO themes (id, name, group_name, description, active)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            group_name = excluded.group_name,
            description = excluded.description,
            active = excluded.active
        "#,
    )
    .bind(theme.id)
    .bind(&theme.name)
    .bind(&theme.group_name)
    .bind(&theme.description)
    .bind(theme.active as i64)
    .execute(pool)
    .await?;

    Ok(())
}
