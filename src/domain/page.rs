use serde::Serialize;

use super::Operation;

/// Number of operations shown per history page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// A requested history page. `page` is 1-based; a zero page or zero size
/// disables pagination and selects the whole ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// The whole ledger, unpaginated.
    pub fn all() -> Self {
        Self { page: 0, size: 0 }
    }

    pub fn is_paginated(&self) -> bool {
        self.page != 0 && self.size != 0
    }

    /// Rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }

    /// Rows to fetch: one past the page, so the extra row can tell whether
    /// anything older exists without a separate count query.
    pub fn probe_limit(&self) -> u64 {
        u64::from(self.size) + 1
    }

    /// `(offset, limit)` to request from the store, or `None` to fetch everything.
    pub fn window(&self) -> Option<(u64, u64)> {
        self.is_paginated().then(|| (self.offset(), self.probe_limit()))
    }
}

/// One page of a user's history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationPage {
    pub operations: Vec<Operation>,
    /// True when older operations exist beyond this page
    pub has_more: bool,
}

impl OperationPage {
    /// Every operation of the ledger; there is never anything more.
    pub fn complete(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            has_more: false,
        }
    }

    /// Build a page from rows fetched with [`PageRequest::probe_limit`].
    /// Rows past `size` only signal continuation and are dropped.
    pub fn from_probe(mut rows: Vec<Operation>, size: u32) -> Self {
        let size = size as usize;
        if rows.len() <= size {
            return Self::complete(rows);
        }
        rows.truncate(size);
        Self {
            operations: rows,
            has_more: true,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
