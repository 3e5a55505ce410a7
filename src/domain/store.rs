use anyhow::Result;
use async_trait::async_trait;

use super::{Operation, UserId};

/// Read access to a user's operations, as consumed by the ledger engine.
///
/// Both methods return operations newest first: `created_at` descending,
/// then `id` descending for identical timestamps. Each call must be answered
/// from a single consistent read.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Up to `limit` operations after skipping the `offset` most recent ones.
    async fn fetch_page(&self, user_id: UserId, offset: u64, limit: u64)
        -> Result<Vec<Operation>>;

    /// Every operation of the user.
    async fn fetch_all(&self, user_id: UserId) -> Result<Vec<Operation>>;
}
