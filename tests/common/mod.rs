// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use casher::application::{Registration, Services};
use casher::domain::{NewOperation, Operation, OperationType, User};
use casher::storage::Repository;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const PASSWORD: &str = "Secret#1";

/// Helper to create test services over a temporary database
pub async fn test_services() -> Result<(Services, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let services = Services::init(db_path.to_str().unwrap()).await?;
    Ok((services, temp_dir))
}

/// Like [`test_services`], also handing out the repository the services share
pub async fn test_setup() -> Result<(Services, Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::init(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
    Ok((Services::new(repo.clone()), repo, temp_dir))
}

/// A second connection to the database behind [`test_setup`], for writing rows
/// the services would never produce themselves
pub async fn raw_pool(temp_dir: &TempDir) -> Result<SqlitePool> {
    let db_path = temp_dir.path().join("test.db");
    Ok(SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?)
}

/// Insert an operation row directly, with a caller-chosen timestamp
pub async fn insert_operation_row(
    pool: &SqlitePool,
    user_id: i64,
    operation_type: OperationType,
    amount_cents: i64,
    subject: &str,
    created_at: &str,
) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO operations (user_id, subject, amount_cents, operation_type, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(subject)
    .bind(amount_cents)
    .bind(operation_type.code())
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub fn registration(login: &str) -> Registration {
    Registration {
        login: login.to_string(),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
        name: format!("{} Test", login),
        birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
    }
}

/// Register a user with the standard test password
pub async fn register(services: &Services, login: &str) -> Result<User> {
    Ok(services.users.register(registration(login)).await?)
}

/// Record `count` operations for a user, subjects "op 1".."op N" in insertion order.
/// Every third operation is a withdrawal; amounts are `n * 100`.
pub async fn seed_operations(
    services: &Services,
    user: &User,
    count: i64,
) -> Result<Vec<Operation>> {
    let mut saved = Vec::new();
    for n in 1..=count {
        let operation_type = if n % 3 == 0 {
            OperationType::Withdraw
        } else {
            OperationType::Deposit
        };
        let operation = services
            .operations
            .create(NewOperation::new(user.id, operation_type, n * 100, format!("op {}", n)))
            .await?;
        saved.push(operation);
    }
    Ok(saved)
}

pub fn subjects(operations: &[Operation]) -> Vec<String> {
    operations.iter().map(|op| op.subject.clone()).collect()
}

pub fn expected_subjects(range: impl Iterator<Item = i64>) -> Vec<String> {
    range.map(|n| format!("op {}", n)).collect()
}
