//! Engine services
//!
//! The pure computational core (matcher, balancer, ledger) plus the
//! pipeline that orchestrates it against the collaborator traits.

pub mod diversity_balancer;
pub mod keyword_groups;
pub mod pipeline;
pub mod theme_matcher;
pub mod usage_ledger;

pub use diversity_balancer::DiversityBalancer;
pub use keyword_groups::{KeywordGroup, GROUP_TABLE_VERSION, KEYWORD_GROUPS};
pub use pipeline::AssignmentPipeline;
pub use theme_matcher::{NearMiss, ThemeMatcher, NEAR_MISS_THRESHOLD};
pub use usage_ledger::{UsageLedger, UsageSnapshot};
