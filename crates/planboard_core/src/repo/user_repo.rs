//! User directory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the user records plans and comments point at.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - Deleting a user never touches plans or comments; their references
//!   simply stop resolving.

use crate::model::user::{User, UserId};
use crate::repo::plan_repo::{parse_uuid, RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, RequiredTable};
use rusqlite::{params, Connection};

const REQUIRED_TABLES: &[RequiredTable] =
    &[("users", &["uuid", "name", "email", "username", "created_at"])];

/// Repository interface for the user directory.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user directory.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (uuid, name, email, username, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.name.trim(),
                user.email.trim(),
                user.username.trim(),
                user.created_at,
            ],
        )?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, email, username, created_at
             FROM users
             WHERE uuid = ?1;",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(User {
                id: parse_uuid(&row.get::<_, String>("uuid")?, "users.uuid")?,
                name: row.get("name")?,
                email: row.get("email")?,
                username: row.get("username")?,
                created_at: row.get("created_at")?,
            }));
        }

        Ok(None)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}
