//! Core domain logic for PlanBoard.
//! This crate is the single source of truth for plan invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::plan::{
    Comment, CommentDetail, CommentDraft, CommentId, Plan, PlanDetail, PlanDraft, PlanId,
    PlanSummary, PlanValidationError,
};
pub use model::user::{User, UserContact, UserId, UserName, UserValidationError};
pub use repo::plan_repo::{
    PlanCriteria, PlanListQuery, PlanRepository, RepoError, RepoResult, SqlitePlanRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::plan_service::{PlanStore, PlanStoreError, PlanStoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
