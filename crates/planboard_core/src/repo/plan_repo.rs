//! Plan repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist plan documents (plan row plus ordered comment rows).
//! - Resolve user references with the projection each read path needs.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Plan::validate()` before any SQL mutation.
//! - A save rewrites the whole document in one IMMEDIATE transaction and
//!   only succeeds when the stored `version` matches the caller's copy.
//! - List order is `created_at DESC, uuid ASC`.
//! - Comment order is append order (`position ASC`).

use crate::db::DbError;
use crate::model::plan::{
    Comment, CommentDetail, Plan, PlanDetail, PlanId, PlanSummary, PlanValidationError,
};
use crate::model::user::{User, UserContact, UserId, UserName, UserValidationError};
use crate::repo::schema::{ensure_connection_ready, RequiredTable};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PLANS_DEFAULT_PER_PAGE: u32 = 30;
const PLANS_PER_PAGE_MAX: u32 = 100;

const REQUIRED_TABLES: &[RequiredTable] = &[
    (
        "plans",
        &[
            "uuid",
            "title",
            "body",
            "user_uuid",
            "start_at",
            "end_at",
            "created_at",
            "updated_at",
            "version",
        ],
    ),
    (
        "plan_comments",
        &["uuid", "plan_uuid", "position", "body", "user_uuid", "created_at"],
    ),
    ("users", &["uuid", "name", "email", "username", "created_at"]),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for plan and user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Plan invariants rejected the write.
    Validation(PlanValidationError),
    /// User invariants rejected the write.
    UserValidation(UserValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist.
    NotFound(Uuid),
    /// Stored plan version moved past the caller's copy.
    VersionConflict { id: PlanId, expected_version: u32 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::VersionConflict {
                id,
                expected_version,
            } => write!(
                f,
                "plan {id} was modified concurrently; expected version {expected_version}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "plan repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "plan repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "plan repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::UserValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlanValidationError> for RepoError {
    fn from(value: PlanValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter predicate over plan fields. Set fields are ANDed; the default
/// value matches every plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCriteria {
    /// Exact owner match.
    pub user: Option<UserId>,
    /// ASCII case-insensitive substring of the title. Blank is ignored.
    pub title_contains: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<i64>,
    /// Exclusive upper bound on `created_at`.
    pub created_until: Option<i64>,
    /// Instant that must fall inside `[start, end]`; missing bounds are open.
    pub active_at: Option<i64>,
}

/// Query options for listing plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanListQuery {
    pub criteria: PlanCriteria,
    /// Page size. Defaults to 30; pages are laid out at this size but at
    /// most 100 rows come back.
    pub per_page: Option<u32>,
    /// Zero-based page index.
    pub page: u32,
}

impl PlanListQuery {
    pub fn page(per_page: u32, page: u32) -> Self {
        Self {
            criteria: PlanCriteria::default(),
            per_page: Some(per_page),
            page,
        }
    }

    pub fn with_criteria(mut self, criteria: PlanCriteria) -> Self {
        self.criteria = criteria;
        self
    }
}

/// Repository interface for plan documents.
pub trait PlanRepository {
    /// Inserts a new plan document with its comments.
    fn insert_plan(&self, plan: &Plan) -> RepoResult<PlanId>;
    /// Rewrites an existing plan document and returns its new version.
    fn save_plan(&self, plan: &Plan) -> RepoResult<u32>;
    /// Gets one plan with unresolved references.
    fn get_plan(&self, id: PlanId) -> RepoResult<Option<Plan>>;
    /// Gets one plan with owner resolved to contact fields and comment
    /// authors resolved to full records.
    fn find_plan_detail(&self, id: PlanId) -> RepoResult<Option<PlanDetail>>;
    /// Lists plans with owner resolved to name only.
    fn list_plans(&self, query: &PlanListQuery) -> RepoResult<Vec<PlanSummary>>;
    /// Deletes one plan and its comments.
    fn delete_plan(&self, id: PlanId) -> RepoResult<()>;
}

/// SQLite-backed plan repository.
pub struct SqlitePlanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlanRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn begin_immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl PlanRepository for SqlitePlanRepository<'_> {
    fn insert_plan(&self, plan: &Plan) -> RepoResult<PlanId> {
        plan.validate()?;

        let tx = self.begin_immediate()?;
        tx.execute(
            "INSERT INTO plans (
                uuid,
                title,
                body,
                user_uuid,
                start_at,
                end_at,
                created_at,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                plan.id.to_string(),
                plan.title.trim(),
                plan.body.trim(),
                plan.user.to_string(),
                plan.start,
                plan.end,
                plan.created_at,
                plan.version,
            ],
        )?;
        write_comments(&tx, plan)?;
        tx.commit()?;

        Ok(plan.id)
    }

    fn save_plan(&self, plan: &Plan) -> RepoResult<u32> {
        plan.validate()?;
        let next_version = plan.version.checked_add(1).ok_or_else(|| {
            RepoError::InvalidData(format!("plan {} version counter exhausted", plan.id))
        })?;

        let plan_uuid = plan.id.to_string();
        let tx = self.begin_immediate()?;
        let changed = tx.execute(
            "UPDATE plans
             SET
                title = ?2,
                body = ?3,
                user_uuid = ?4,
                start_at = ?5,
                end_at = ?6,
                version = version + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND version = ?7;",
            params![
                plan_uuid.as_str(),
                plan.title.trim(),
                plan.body.trim(),
                plan.user.to_string(),
                plan.start,
                plan.end,
                plan.version,
            ],
        )?;

        if changed == 0 {
            return Err(if plan_exists(&tx, plan_uuid.as_str())? {
                RepoError::VersionConflict {
                    id: plan.id,
                    expected_version: plan.version,
                }
            } else {
                RepoError::NotFound(plan.id)
            });
        }

        tx.execute(
            "DELETE FROM plan_comments WHERE plan_uuid = ?1;",
            [plan_uuid.as_str()],
        )?;
        write_comments(&tx, plan)?;
        tx.commit()?;

        Ok(next_version)
    }

    fn get_plan(&self, id: PlanId) -> RepoResult<Option<Plan>> {
        let plan_uuid = id.to_string();
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                title,
                body,
                user_uuid,
                start_at,
                end_at,
                created_at,
                version
             FROM plans
             WHERE uuid = ?1;",
        )?;

        let mut rows = stmt.query([plan_uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            let plan = Plan {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "plans.uuid")?,
                title: row.get("title")?,
                body: row.get("body")?,
                user: parse_uuid(&row.get::<_, String>("user_uuid")?, "plans.user_uuid")?,
                start: row.get("start_at")?,
                end: row.get("end_at")?,
                comments: load_comments(self.conn, plan_uuid.as_str())?,
                created_at: row.get("created_at")?,
                version: parse_version(row)?,
            };
            return Ok(Some(plan));
        }

        Ok(None)
    }

    fn find_plan_detail(&self, id: PlanId) -> RepoResult<Option<PlanDetail>> {
        let plan_uuid = id.to_string();
        let mut stmt = self.conn.prepare(
            "SELECT
                p.uuid,
                p.title,
                p.body,
                p.start_at,
                p.end_at,
                p.created_at,
                p.version,
                u.uuid AS owner_uuid,
                u.name AS owner_name,
                u.email AS owner_email
             FROM plans p
             LEFT JOIN users u ON u.uuid = p.user_uuid
             WHERE p.uuid = ?1;",
        )?;

        let mut rows = stmt.query([plan_uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            let user = match row.get::<_, Option<String>>("owner_uuid")? {
                Some(owner_uuid) => Some(UserContact {
                    id: parse_uuid(&owner_uuid, "users.uuid")?,
                    name: row.get("owner_name")?,
                    email: row.get("owner_email")?,
                }),
                None => None,
            };
            return Ok(Some(PlanDetail {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "plans.uuid")?,
                title: row.get("title")?,
                body: row.get("body")?,
                user,
                start: row.get("start_at")?,
                end: row.get("end_at")?,
                comments: load_comment_details(self.conn, plan_uuid.as_str())?,
                created_at: row.get("created_at")?,
                version: parse_version(row)?,
            }));
        }

        Ok(None)
    }

    fn list_plans(&self, query: &PlanListQuery) -> RepoResult<Vec<PlanSummary>> {
        let mut sql = String::from(
            "SELECT
                p.uuid,
                p.title,
                p.body,
                p.start_at,
                p.end_at,
                p.created_at,
                p.version,
                u.uuid AS owner_uuid,
                u.name AS owner_name
             FROM plans p
             LEFT JOIN users u ON u.uuid = p.user_uuid
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();
        let criteria = &query.criteria;

        if let Some(user) = criteria.user {
            sql.push_str(" AND p.user_uuid = ?");
            bind_values.push(Value::Text(user.to_string()));
        }

        if let Some(needle) = criteria
            .title_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            sql.push_str(" AND instr(lower(p.title), lower(?)) > 0");
            bind_values.push(Value::Text(needle.to_string()));
        }

        if let Some(from) = criteria.created_from {
            sql.push_str(" AND p.created_at >= ?");
            bind_values.push(Value::Integer(from));
        }

        if let Some(until) = criteria.created_until {
            sql.push_str(" AND p.created_at < ?");
            bind_values.push(Value::Integer(until));
        }

        if let Some(instant) = criteria.active_at {
            sql.push_str(
                " AND (p.start_at IS NULL OR p.start_at <= ?)
                  AND (p.end_at IS NULL OR p.end_at >= ?)",
            );
            bind_values.push(Value::Integer(instant));
            bind_values.push(Value::Integer(instant));
        }

        // Offset follows the requested page size; only the row count is capped.
        sql.push_str(" ORDER BY p.created_at DESC, p.uuid ASC");
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(normalize_per_page(query.per_page))));
        bind_values.push(Value::Integer(page_offset(
            requested_per_page(query.per_page),
            query.page,
        )));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut plans = Vec::new();
        while let Some(row) = rows.next()? {
            let plan_uuid: String = row.get("uuid")?;
            let user = match row.get::<_, Option<String>>("owner_uuid")? {
                Some(owner_uuid) => Some(UserName {
                    id: parse_uuid(&owner_uuid, "users.uuid")?,
                    name: row.get("owner_name")?,
                }),
                None => None,
            };
            plans.push(PlanSummary {
                id: parse_uuid(&plan_uuid, "plans.uuid")?,
                title: row.get("title")?,
                body: row.get("body")?,
                user,
                start: row.get("start_at")?,
                end: row.get("end_at")?,
                comments: load_comments(self.conn, plan_uuid.as_str())?,
                created_at: row.get("created_at")?,
                version: parse_version(row)?,
            });
        }

        Ok(plans)
    }

    fn delete_plan(&self, id: PlanId) -> RepoResult<()> {
        let plan_uuid = id.to_string();
        let tx = self.begin_immediate()?;
        tx.execute(
            "DELETE FROM plan_comments WHERE plan_uuid = ?1;",
            [plan_uuid.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM plans WHERE uuid = ?1;", [plan_uuid.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }
}

/// Page size as the caller asked for it, with `None`/`0` defaulted.
pub fn requested_per_page(per_page: Option<u32>) -> u32 {
    match per_page {
        Some(0) | None => PLANS_DEFAULT_PER_PAGE,
        Some(value) => value,
    }
}

/// Rows returned for one page: the requested size capped at 100.
pub fn normalize_per_page(per_page: Option<u32>) -> u32 {
    requested_per_page(per_page).min(PLANS_PER_PAGE_MAX)
}

/// Rows skipped before `page`; saturates instead of overflowing.
pub fn page_offset(per_page: u32, page: u32) -> i64 {
    i64::from(per_page)
        .checked_mul(i64::from(page))
        .unwrap_or(i64::MAX)
}

fn write_comments(tx: &Transaction<'_>, plan: &Plan) -> RepoResult<()> {
    let plan_uuid = plan.id.to_string();
    let mut stmt = tx.prepare(
        "INSERT INTO plan_comments (
            uuid,
            plan_uuid,
            position,
            body,
            user_uuid,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
    )?;
    for (position, comment) in plan.comments.iter().enumerate() {
        let position = i64::try_from(position).map_err(|_| {
            RepoError::InvalidData(format!("comment position overflow in plan {}", plan.id))
        })?;
        stmt.execute(params![
            comment.id.to_string(),
            plan_uuid.as_str(),
            position,
            comment.body.as_str(),
            comment.user.to_string(),
            comment.created_at,
        ])?;
    }
    Ok(())
}

fn load_comments(conn: &Connection, plan_uuid: &str) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, body, user_uuid, created_at
         FROM plan_comments
         WHERE plan_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([plan_uuid])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(Comment {
            id: parse_uuid(&row.get::<_, String>("uuid")?, "plan_comments.uuid")?,
            body: row.get("body")?,
            user: parse_uuid(
                &row.get::<_, String>("user_uuid")?,
                "plan_comments.user_uuid",
            )?,
            created_at: row.get("created_at")?,
        });
    }
    Ok(comments)
}

fn load_comment_details(conn: &Connection, plan_uuid: &str) -> RepoResult<Vec<CommentDetail>> {
    let mut stmt = conn.prepare(
        "SELECT
            c.uuid,
            c.body,
            c.created_at,
            u.uuid AS author_uuid,
            u.name AS author_name,
            u.email AS author_email,
            u.username AS author_username,
            u.created_at AS author_created_at
         FROM plan_comments c
         LEFT JOIN users u ON u.uuid = c.user_uuid
         WHERE c.plan_uuid = ?1
         ORDER BY c.position ASC;",
    )?;
    let mut rows = stmt.query([plan_uuid])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        let user = match row.get::<_, Option<String>>("author_uuid")? {
            Some(author_uuid) => Some(User {
                id: parse_uuid(&author_uuid, "users.uuid")?,
                name: row.get("author_name")?,
                email: row.get("author_email")?,
                username: row.get("author_username")?,
                created_at: row.get("author_created_at")?,
            }),
            None => None,
        };
        comments.push(CommentDetail {
            id: parse_uuid(&row.get::<_, String>("uuid")?, "plan_comments.uuid")?,
            body: row.get("body")?,
            user,
            created_at: row.get("created_at")?,
        });
    }
    Ok(comments)
}

fn plan_exists(conn: &Connection, plan_uuid: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM plans WHERE uuid = ?1);",
        [plan_uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_version(row: &Row<'_>) -> RepoResult<u32> {
    let raw: i64 = row.get("version")?;
    u32::try_from(raw)
        .map_err(|_| RepoError::InvalidData(format!("invalid version `{raw}` in plans.version")))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
