use thiserror::Error;

use crate::domain::UserId;

use super::{PasswordError, ValidationErrors};

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown login and wrong password are reported the same way.
    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Login already exists: {0}")]
    LoginExists(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Balance of user {0} is out of range")]
    BalanceOverflow(UserId),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
