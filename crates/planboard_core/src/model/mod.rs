//! Domain model for plans, their comments and the users they reference.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Provide explicit constructor defaults instead of schema-declared ones.
//!
//! # Invariants
//! - Every plan, comment and user is identified by a stable, non-nil UUID.
//! - Users are referenced by id from plans/comments, never embedded.
//! - Timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod plan;
pub mod user;

/// Returns the current wall-clock time in Unix epoch milliseconds.
///
/// Clock values before the epoch collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
