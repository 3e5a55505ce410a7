use anyhow::Result;

use super::{compute_balance, Cents, OperationPage, OperationStore, PageRequest, UserId};

/// Pagination and balance over a user's ledger.
///
/// The engine holds no state of its own. Every call is a single read from the
/// store, and read failures are returned to the caller unchanged.
pub struct LedgerEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: OperationStore + ?Sized> LedgerEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetch one page of history, newest first.
    /// `page == 0` or `size == 0` returns the whole ledger.
    pub async fn get_page(&self, user_id: UserId, page: u32, size: u32) -> Result<OperationPage> {
        let request = PageRequest::new(page, size);
        match request.window() {
            Some((offset, limit)) => {
                let rows = self.store.fetch_page(user_id, offset, limit).await?;
                Ok(OperationPage::from_probe(rows, size))
            }
            None => {
                let rows = self.store.fetch_all(user_id).await?;
                Ok(OperationPage::complete(rows))
            }
        }
    }

    /// Recompute the balance from the full ledger.
    pub async fn compute_balance(&self, user_id: UserId) -> Result<Cents> {
        let operations = self.store.fetch_all(user_id).await?;
        Ok(compute_balance(&operations)?)
    }
}
