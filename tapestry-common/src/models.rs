//! Shared domain models for Tapestry services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Curated taxonomy entry
///
/// Owned and written by the taxonomy service; the theme engine only ever
/// reads active themes. Immutable for the duration of a processing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    /// Theme family for display grouping (e.g. "Growth", "Connection")
    pub group_name: Option<String>,
    pub description: String,
    pub active: bool,
}

impl Theme {
    /// Create an active theme with an empty description
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            group_name: None,
            description: String::new(),
            active: true,
        }
    }

    /// Create an active theme with a description
    pub fn with_description(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            group_name: None,
            description: description.into(),
            active: true,
        }
    }
}

/// Final theme assignment for one story
///
/// `theme_ids` is held in canonical set form: sorted ascending with no
/// duplicates. An assignment is written all-or-nothing per story and
/// overwritten (never merged) on re-assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeAssignment {
    pub story_id: Uuid,
    pub theme_ids: Vec<i64>,
    /// Raw labels this assignment was computed from, in upstream order.
    /// Re-assignment replays exactly these labels.
    pub source_labels: Vec<String>,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ThemeAssignment {
    /// Create an assignment, normalizing `theme_ids` to canonical form
    pub fn new(
        story_id: Uuid,
        mut theme_ids: Vec<i64>,
        source_labels: Vec<String>,
        run_id: Uuid,
    ) -> Self {
        theme_ids.sort_unstable();
        theme_ids.dedup();
        Self {
            story_id,
            theme_ids,
            source_labels,
            run_id,
            created_at: Utc::now(),
        }
    }
}
