use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, UserId};

pub type OperationId = i64;

/// Direction of an operation. The amount itself is always a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Money coming in (balance increases)
    Deposit,
    /// Money going out (balance decreases)
    Withdraw,
}

impl OperationType {
    /// Integer code persisted in the `operations.operation_type` column.
    pub fn code(&self) -> i64 {
        match self {
            OperationType::Deposit => 1,
            OperationType::Withdraw => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(OperationType::Deposit),
            2 => Some(OperationType::Withdraw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(OperationType::Deposit),
            "withdraw" => Some(OperationType::Withdraw),
            _ => None,
        }
    }

    /// Apply this operation's direction to a magnitude.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            OperationType::Deposit => amount_cents,
            OperationType::Withdraw => -amount_cents,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry. Operations are immutable once stored; the only
/// supported mutation is removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Assigned by the store on insert
    pub id: OperationId,
    pub user_id: UserId,
    pub subject: String,
    /// Amount in cents (never negative, direction lives in `operation_type`)
    pub amount_cents: Cents,
    pub operation_type: OperationType,
    pub message: String,
    /// Assigned by the store on insert, drives history ordering
    pub created_at: DateTime<Utc>,
}

impl Operation {
    /// Contribution of this operation to the owner's balance.
    pub fn signed_amount(&self) -> Cents {
        self.operation_type.signed(self.amount_cents)
    }
}

/// An operation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOperation {
    pub user_id: UserId,
    pub subject: String,
    pub amount_cents: Cents,
    pub operation_type: OperationType,
    pub message: String,
}

impl NewOperation {
    pub fn new(
        user_id: UserId,
        operation_type: OperationType,
        amount_cents: Cents,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            amount_cents,
            operation_type,
            message: String::new(),
        }
    }

    pub fn deposit(user_id: UserId, amount_cents: Cents, subject: impl Into<String>) -> Self {
        Self::new(user_id, OperationType::Deposit, amount_cents, subject)
    }

    pub fn withdraw(user_id: UserId, amount_cents: Cents, subject: impl Into<String>) -> Self {
        Self::new(user_id, OperationType::Withdraw, amount_cents, subject)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
