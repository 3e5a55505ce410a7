use tracing::{debug, error, info, Span};

use crate::domain::{
    compute_totals, LedgerEngine, LedgerTotals, NewOperation, Operation, OperationId,
    OperationPage, UserId, DEFAULT_PAGE_SIZE,
};
use crate::storage::Repository;

use super::{validate_operation, AppError};

/// Recording, listing and removing a user's operations.
pub struct OperationService {
    repo: Repository,
    span: Span,
    page_size: u32,
}

impl OperationService {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            span: Span::none(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Emit this service's events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// One page of history, newest first. Page `0` returns the whole history.
    pub async fn list(&self, user_id: UserId, page: u32) -> Result<OperationPage, AppError> {
        let result = LedgerEngine::new(&self.repo)
            .get_page(user_id, page, self.page_size)
            .await
            .map_err(|err| {
                error!(parent: &self.span, user_id, page, error = %err, "get page failed");
                AppError::Database(err)
            })?;

        debug!(
            parent: &self.span,
            user_id,
            page,
            count = result.len(),
            has_more = result.has_more,
            "fetched history page"
        );
        Ok(result)
    }

    /// The full, unpaginated history, newest first.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Operation>, AppError> {
        let page = LedgerEngine::new(&self.repo)
            .get_page(user_id, 0, 0)
            .await
            .map_err(|err| {
                error!(parent: &self.span, user_id, error = %err, "get history failed");
                AppError::Database(err)
            })?;
        Ok(page.operations)
    }

    /// Deposit and withdrawal totals over the whole history.
    pub async fn totals(&self, user_id: UserId) -> Result<LedgerTotals, AppError> {
        compute_totals(&self.history(user_id).await?).map_err(|err| {
            error!(parent: &self.span, user_id, error = %err, "get totals failed");
            AppError::BalanceOverflow(user_id)
        })
    }

    /// Record a new operation.
    pub async fn create(&self, operation: NewOperation) -> Result<Operation, AppError> {
        validate_operation(&operation.subject, operation.amount_cents)?;

        let saved = self.repo.save_operation(&operation).await.map_err(|err| {
            error!(
                parent: &self.span,
                user_id = operation.user_id,
                operation_type = %operation.operation_type,
                amount_cents = operation.amount_cents,
                error = %err,
                "create operation failed"
            );
            AppError::Database(err)
        })?;

        info!(
            parent: &self.span,
            user_id = saved.user_id,
            operation_id = saved.id,
            operation_type = %saved.operation_type,
            amount_cents = saved.amount_cents,
            "operation recorded"
        );
        Ok(saved)
    }

    /// Remove one of the user's operations.
    ///
    /// Removing an operation that does not exist, or that belongs to someone
    /// else, succeeds without changing anything. Returns whether a row was removed.
    pub async fn remove(&self, user_id: UserId, operation_id: OperationId) -> Result<bool, AppError> {
        let removed = self
            .repo
            .delete_operation(user_id, operation_id)
            .await
            .map_err(|err| {
                error!(parent: &self.span, user_id, operation_id, error = %err, "remove operation failed");
                AppError::Database(err)
            })?;

        if removed {
            info!(parent: &self.span, user_id, operation_id, "operation removed");
        } else {
            debug!(parent: &self.span, user_id, operation_id, "nothing to remove");
        }
        Ok(removed)
    }
}
