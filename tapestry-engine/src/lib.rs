//! tapestry-engine library interface
//!
//! Theme normalization and diversity balancing for the Tapestry story
//! archive: maps free-text labels from the upstream generator onto the
//! curated theme taxonomy while keeping corpus-wide theme usage from
//! collapsing onto a handful of generic themes.
//!
//! The matching and balancing core is pure and synchronous; all I/O is
//! behind the collaborator traits in [`types`], so integration tests can
//! substitute in-memory fakes for the SQLite stores.

pub mod config;
pub mod report;
pub mod services;
pub mod stores;
pub mod types;

pub use config::EngineParams;
pub use report::RunReport;
pub use types::{CommitMode, RunMode};
