//! Credential store: signup, login, and identity lookup.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use closet_shared::password::{hash_password, verify_password};

use crate::database::{ts_column, ts_to_sql, uuid_column, Database};
use crate::error::{not_found, Result, StoreError};
use crate::models::{PublicUser, UserRecord};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    /// Register a new user. Fails with [`StoreError::Duplicate`] if the email
    /// is already taken; exactly one record is ever created per email.
    pub fn register_user(&self, email: &str, password: &str, name: &str) -> Result<PublicUser> {
        let email = normalize_email(email);
        let name = name.trim();
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(StoreError::InvalidInput("Missing fields".into()));
        }

        if self.find_user_by_email(&email)?.is_some() {
            return Err(StoreError::Duplicate);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            email,
            name: name.to_string(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        // The UNIQUE constraint catches a concurrent signup that slipped
        // past the lookup above.
        self.conn()
            .execute(
                "INSERT INTO users (id, email, name, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.email,
                    record.name,
                    record.password_hash,
                    ts_to_sql(&record.created_at),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    StoreError::Duplicate
                }
                other => StoreError::Sqlite(other),
            })?;

        info!(user_id = %record.id, "User registered");
        Ok(record.public())
    }

    /// Check an email/password pair. Unknown email and wrong password both
    /// yield [`StoreError::InvalidCredentials`].
    pub fn authenticate(&self, email: &str, password: &str) -> Result<PublicUser> {
        let Some(record) = self.find_user_by_email(&normalize_email(email))? else {
            debug!("Login for unknown email");
            return Err(StoreError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash)? {
            debug!(user_id = %record.id, "Login with wrong password");
            return Err(StoreError::InvalidCredentials);
        }

        Ok(record.public())
    }

    pub fn get_user(&self, id: Uuid) -> Result<PublicUser> {
        self.conn()
            .query_row(
                "SELECT id, email, name, password_hash, created_at FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map(|record| record.public())
            .map_err(not_found)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.conn()
            .query_row(
                "SELECT id, email, name, password_hash, created_at FROM users WHERE email = ?1",
                params![normalize_email(email)],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    pub fn count_users_with_email(&self, email: &str) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            params![normalize_email(email)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: ts_column(row, 4)?,
    })
}
