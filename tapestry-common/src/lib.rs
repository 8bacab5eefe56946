//! # Tapestry Common Library
//!
//! Shared code for Tapestry services including:
//! - Database models and queries (themes, assignments, story labels)
//! - Error types
//! - Configuration loading and database path resolution

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Theme, ThemeAssignment};
