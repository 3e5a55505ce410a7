use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::Cents;

pub type UserId = i64;

/// A registered ledger owner. The balance is not part of this
/// record: it is derived from the operations every time it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// Argon2 PHC string, never the plaintext password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub birth: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Completed years since `birth` as of `today`. Zero for birth dates in the future.
    pub fn age(&self, today: NaiveDate) -> u32 {
        age_on(self.birth, today)
    }
}

fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    if today < birth {
        return 0;
    }
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// A user that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub name: String,
    pub birth: NaiveDate,
}

/// A user together with the balance computed from their ledger.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub user: User,
    pub balance: Cents,
}
