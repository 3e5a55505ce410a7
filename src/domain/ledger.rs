use thiserror::Error;

use super::{Cents, Operation, OperationType};

/// The ledger's running total left the range of [`Cents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ledger total does not fit in 64-bit cents")]
pub struct BalanceOverflow;

/// Compute a balance from a complete, unpaginated list of operations.
/// Balance = sum of deposits - sum of withdrawals.
///
/// The fold is order-independent, so callers may pass the ledger in any order.
/// It must be given the whole ledger: a page of history is not a balance.
pub fn compute_balance(operations: &[Operation]) -> Result<Cents, BalanceOverflow> {
    operations.iter().try_fold(0, |balance: Cents, operation| {
        balance
            .checked_add(operation.signed_amount())
            .ok_or(BalanceOverflow)
    })
}

/// Deposit and withdrawal totals over a set of operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub deposited: Cents,
    pub withdrawn: Cents,
}

impl LedgerTotals {
    pub fn balance(&self) -> Cents {
        self.deposited - self.withdrawn
    }
}

pub fn compute_totals(operations: &[Operation]) -> Result<LedgerTotals, BalanceOverflow> {
    operations
        .iter()
        .try_fold(LedgerTotals::default(), |mut totals, operation| {
            let total = match operation.operation_type {
                OperationType::Deposit => &mut totals.deposited,
                OperationType::Withdraw => &mut totals.withdrawn,
            };
            *total = total
                .checked_add(operation.amount_cents)
                .ok_or(BalanceOverflow)?;
            Ok(totals)
        })
}
