//! Plan store use-case service.
//!
//! # Responsibility
//! - Provide create/update/comment/load/list/delete entry points for plans.
//! - Translate repository faults into the validation / not-found / store
//!   taxonomy callers handle.
//!
//! # Invariants
//! - `add_comment` and `update_plan` never mutate the caller's plan; the
//!   returned plan reflects what was durably saved.
//! - A failed save leaves the stored document untouched.
//! - Log events carry ids and counts only, never titles or bodies.

use crate::model::plan::{
    Comment, CommentDraft, Plan, PlanDetail, PlanDraft, PlanId, PlanSummary, PlanValidationError,
};
use crate::model::user::UserId;
use crate::repo::plan_repo::{normalize_per_page, PlanListQuery, PlanRepository, RepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for plan use-cases.
#[derive(Debug)]
pub enum PlanStoreError {
    /// Title/body invariants rejected the write; nothing was persisted.
    Validation(PlanValidationError),
    /// Target plan does not exist.
    NotFound(PlanId),
    /// Persistence-layer failure, including version conflicts.
    Store(RepoError),
}

impl Display for PlanStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "plan not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlanStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<PlanValidationError> for PlanStoreError {
    fn from(value: PlanValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for PlanStoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type PlanStoreResult<T> = Result<T, PlanStoreError>;

/// Persistence-and-query facade for plans over an injected repository.
pub struct PlanStore<R: PlanRepository> {
    repo: R,
}

impl<R: PlanRepository> PlanStore<R> {
    /// Creates a store using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a plan from caller input.
    ///
    /// # Contract
    /// - Title and body are trimmed; blank values fail with `Validation`
    ///   and persist nothing.
    /// - The store assigns `id` and `created_at`.
    pub fn create_plan(&self, draft: &PlanDraft) -> PlanStoreResult<Plan> {
        let plan = Plan::from_draft(draft)?;
        self.repo.insert_plan(&plan)?;
        info!(
            "event=plan_create module=service status=ok plan_id={} user_id={}",
            plan.id, plan.user
        );
        Ok(plan)
    }

    /// Saves edited plan fields as a full-document write.
    ///
    /// Returns the saved plan carrying its new version. The input must be
    /// the latest copy; a stale copy fails with `Store(VersionConflict)`.
    pub fn update_plan(&self, plan: &Plan) -> PlanStoreResult<Plan> {
        let mut staged = plan.clone();
        staged.normalize();
        self.save(staged, "plan_update")
    }

    /// Appends a comment authored by `user` and persists the whole plan.
    ///
    /// Only the author's id is required. The comment body is stored as
    /// given, without validation.
    ///
    /// # Contract
    /// - All-or-nothing: on any error the caller's `plan` and the stored
    ///   document are unchanged.
    /// - Fails with `Validation` when the plan's own title/body are blank.
    pub fn add_comment(
        &self,
        plan: &Plan,
        user: UserId,
        comment: &CommentDraft,
    ) -> PlanStoreResult<Plan> {
        let mut staged = plan.clone();
        staged.normalize();
        staged.comments.push(Comment::new(user, comment));
        self.save(staged, "plan_add_comment")
    }

    /// Loads one plan with its owner resolved to name/email and every
    /// comment author resolved to the full user record.
    pub fn load(&self, id: PlanId) -> PlanStoreResult<PlanDetail> {
        self.repo
            .find_plan_detail(id)?
            .ok_or(PlanStoreError::NotFound(id))
    }

    /// Gets one plan with unresolved references, ready for `update_plan`
    /// or `add_comment`.
    pub fn get_plan(&self, id: PlanId) -> PlanStoreResult<Plan> {
        self.repo.get_plan(id)?.ok_or(PlanStoreError::NotFound(id))
    }

    /// Lists one page of plans, most recent first.
    ///
    /// A page past the last result yields an empty list.
    pub fn list(&self, query: &PlanListQuery) -> PlanStoreResult<Vec<PlanSummary>> {
        let items = self.repo.list_plans(query)?;
        debug!(
            "event=plan_list module=service status=ok per_page={} page={} count={}",
            normalize_per_page(query.per_page),
            query.page,
            items.len()
        );
        Ok(items)
    }

    /// Deletes a plan and its comments. Referenced users are untouched.
    pub fn delete_plan(&self, id: PlanId) -> PlanStoreResult<()> {
        self.repo.delete_plan(id)?;
        info!("event=plan_delete module=service status=ok plan_id={id}");
        Ok(())
    }

    fn save(&self, mut staged: Plan, event: &'static str) -> PlanStoreResult<Plan> {
        match self.repo.save_plan(&staged) {
            Ok(version) => {
                staged.version = version;
                info!(
                    "event={} module=service status=ok plan_id={} version={} comments={}",
                    event,
                    staged.id,
                    version,
                    staged.comments.len()
                );
                Ok(staged)
            }
            Err(err) => {
                warn!(
                    "event={} module=service status=error plan_id={} error={}",
                    event, staged.id, err
                );
                Err(err.into())
            }
        }
    }
}
