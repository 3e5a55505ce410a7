use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::domain::{
    NewOperation, NewUser, Operation, OperationId, OperationStore, OperationType, User, UserId,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const OPERATION_COLUMNS: &str =
    "id, user_id, subject, amount_cents, operation_type, message, created_at";

const USER_COLUMNS: &str = "id, login, password_hash, name, birth, created_at";

/// Raised by [`Repository::save_user`] when the login is already registered.
#[derive(Debug, Error)]
#[error("login already taken: {0}")]
pub struct DuplicateLogin(pub String);

/// Repository for persisting and querying users and their operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user and return it with its assigned ID.
    pub async fn save_user(&self, user: &NewUser) -> Result<User> {
        let created_at = Utc::now().trunc_subsecs(6);

        let result = sqlx::query(
            r#"
            INSERT INTO users (login, password_hash, name, birth, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.birth.format(DATE_FORMAT).to_string())
        .bind(encode_timestamp(created_at))
        .fetch_one(&self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(DuplicateLogin(user.login.clone()).into());
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to save user")),
        };

        Ok(User {
            id: row.get("id"),
            login: user.login.clone(),
            password_hash: user.password_hash.clone(),
            name: user.name.clone(),
            birth: user.birth,
            created_at,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by login.
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE login = ?", USER_COLUMNS))
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by login")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let birth_str: String = row.get("birth");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: row.get("id"),
            login: row.get("login"),
            password_hash: row.get("password_hash"),
            name: row.get("name"),
            birth: NaiveDate::parse_from_str(&birth_str, DATE_FORMAT)
                .context("Invalid birth date")?,
            created_at: decode_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Ledger operations
    // ========================

    /// Save a new operation. The store assigns its ID and creation time.
    /// A failed insert (unknown user, constraint violation) leaves no row.
    ///
    /// The creation time never precedes the user's newest operation, so history
    /// order follows insertion order even if the system clock steps back.
    pub async fn save_operation(&self, operation: &NewOperation) -> Result<Operation> {
        let now = Utc::now().trunc_subsecs(6);

        let row = sqlx::query(
            r#"
            INSERT INTO operations (user_id, subject, amount_cents, operation_type, message, created_at)
            VALUES (?, ?, ?, ?, ?, MAX(?, COALESCE(
                (SELECT MAX(created_at) FROM operations WHERE user_id = ?), ''
            )))
            RETURNING id, created_at
            "#,
        )
        .bind(operation.user_id)
        .bind(&operation.subject)
        .bind(operation.amount_cents)
        .bind(operation.operation_type.code())
        .bind(&operation.message)
        .bind(encode_timestamp(now))
        .bind(operation.user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save operation")?;

        let created_at_str: String = row.get("created_at");
        let created_at =
            decode_timestamp(&created_at_str).context("Invalid created_at timestamp")?;

        Ok(Operation {
            id: row.get("id"),
            user_id: operation.user_id,
            subject: operation.subject.clone(),
            amount_cents: operation.amount_cents,
            operation_type: operation.operation_type,
            message: operation.message.clone(),
            created_at,
        })
    }

    /// Delete an operation owned by `user_id`.
    /// Returns whether a row was removed; a missing row is not an error.
    pub async fn delete_operation(&self, user_id: UserId, id: OperationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM operations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete operation")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_operation(row: &SqliteRow) -> Result<Operation> {
        let type_code: i64 = row.get("operation_type");
        let created_at_str: String = row.get("created_at");

        Ok(Operation {
            id: row.get("id"),
            user_id: row.get("user_id"),
            subject: row.get("subject"),
            amount_cents: row.get("amount_cents"),
            operation_type: OperationType::from_code(type_code)
                .ok_or_else(|| anyhow::anyhow!("Invalid operation type: {}", type_code))?,
            message: row.get("message"),
            created_at: decode_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }
}

#[async_trait]
impl OperationStore for Repository {
    async fn fetch_page(
        &self,
        user_id: UserId,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Operation>> {
        let offset = i64::try_from(offset).context("Page offset out of range")?;
        let limit = i64::try_from(limit).context("Page limit out of range")?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM operations
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            OPERATION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch operations page")?;

        rows.iter().map(Self::row_to_operation).collect()
    }

    async fn fetch_all(&self, user_id: UserId) -> Result<Vec<Operation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM operations
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
            OPERATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch operations")?;

        rows.iter().map(Self::row_to_operation).collect()
    }
}

/// Fixed-width UTC timestamps, so that text order is chronological order.
fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_timestamps_sort_lexically() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = whole + chrono::Duration::microseconds(1);

        let a = encode_timestamp(whole);
        let b = encode_timestamp(later);
        assert_eq!(a, "2024-03-01T12:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_timestamp_roundtrip_keeps_micros() {
        let now = Utc::now().trunc_subsecs(6);
        assert_eq!(decode_timestamp(&encode_timestamp(now)).unwrap(), now);
    }
}
