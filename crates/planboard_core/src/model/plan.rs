//! Plan domain model.
//!
//! # Responsibility
//! - Define the plan document and its embedded comment sequence.
//! - Define hydrated read models produced by reference resolution.
//! - Own title/body normalization and validation.
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - `title` and `body` are stored trimmed and must be non-empty.
//! - `comments` is append-only; insertion order is display order.
//! - `created_at` is fixed at creation.
//! - Comment bodies are not validated.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::now_epoch_ms;
use super::user::{User, UserContact, UserId, UserName};

/// Stable identifier of a plan document.
pub type PlanId = Uuid;

/// Stable identifier of a comment inside a plan.
pub type CommentId = Uuid;

/// Validation failures for plan documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanValidationError {
    NilId,
    BlankTitle,
    BlankBody,
}

impl Display for PlanValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "plan id cannot be nil"),
            Self::BlankTitle => write!(f, "Plan title cannot be blank"),
            Self::BlankBody => write!(f, "Plan body cannot be blank"),
        }
    }
}

impl Error for PlanValidationError {}

/// Caller input for creating a plan.
///
/// Defaults mirror an empty form: blank title/body and no date range. A
/// default draft is therefore invalid until title and body are filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDraft {
    pub title: String,
    pub body: String,
    pub user: UserId,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl PlanDraft {
    pub fn new(user: UserId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            user,
            start: None,
            end: None,
        }
    }

    /// Sets the optional date range. No ordering between bounds is enforced.
    pub fn with_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// Caller input for appending a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub body: String,
}

impl CommentDraft {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// Comment embedded in a plan, with its author kept as a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub body: String,
    pub user: UserId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Comment {
    /// Builds a new comment stamped with the current time.
    ///
    /// The body is stored verbatim: no trimming, no blank check.
    pub fn new(user: UserId, draft: &CommentDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: draft.body.clone(),
            user,
            created_at: now_epoch_ms(),
        }
    }
}

/// Canonical stored plan document with unresolved references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub title: String,
    pub body: String,
    pub user: UserId,
    /// Unix epoch milliseconds.
    pub start: Option<i64>,
    /// Unix epoch milliseconds.
    pub end: Option<i64>,
    pub comments: Vec<Comment>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Optimistic concurrency counter, bumped by every successful save.
    pub version: u32,
}

impl Plan {
    /// Builds a plan from a draft with a generated id and creation time.
    ///
    /// # Errors
    /// - `BlankTitle` / `BlankBody` when the trimmed field is empty.
    pub fn from_draft(draft: &PlanDraft) -> Result<Self, PlanValidationError> {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Builds a plan from a draft with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: PlanId, draft: &PlanDraft) -> Result<Self, PlanValidationError> {
        let plan = Self {
            id,
            title: draft.title.trim().to_string(),
            body: draft.body.trim().to_string(),
            user: draft.user,
            start: draft.start,
            end: draft.end,
            comments: Vec::new(),
            created_at: now_epoch_ms(),
            version: 0,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Trims surrounding whitespace from `title` and `body` in place.
    pub fn normalize(&mut self) {
        let title = self.title.trim();
        if title.len() != self.title.len() {
            self.title = title.to_string();
        }
        let body = self.body.trim();
        if body.len() != self.body.len() {
            self.body = body.to_string();
        }
    }

    /// Checks the invariants enforced at every save.
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if self.id.is_nil() {
            return Err(PlanValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(PlanValidationError::BlankTitle);
        }
        if self.body.trim().is_empty() {
            return Err(PlanValidationError::BlankBody);
        }
        Ok(())
    }
}

/// Comment with its author resolved to the full user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDetail {
    pub id: CommentId,
    pub body: String,
    /// `None` when the author no longer exists in the directory.
    pub user: Option<User>,
    pub created_at: i64,
}

/// Plan hydrated for single-item display (`load`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetail {
    pub id: PlanId,
    pub title: String,
    pub body: String,
    /// Owner resolved to name and email; `None` for a dangling reference.
    pub user: Option<UserContact>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub comments: Vec<CommentDetail>,
    pub created_at: i64,
    pub version: u32,
}

/// Plan hydrated for list display (`list`).
///
/// Comment authors stay unresolved ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: PlanId,
    pub title: String,
    pub body: String,
    /// Owner resolved to name only; `None` for a dangling reference.
    pub user: Option<UserName>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub comments: Vec<Comment>,
    pub created_at: i64,
    pub version: u32,
}
