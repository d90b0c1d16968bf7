//! Expense persistence contract.

use std::sync::Arc;

use thiserror::Error;

use claimflow_core::{ExpectedVersion, ExpenseId};
use claimflow_expense::Expense;

/// Repository operation error.
///
/// `NotFound` and `Conflict` are expected, recoverable outcomes; `Storage`
/// covers infrastructure failures (backend unreachable, corrupt state) and
/// stays distinct from the business taxonomy.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("expense not found")]
    NotFound,

    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// The only component allowed to persist expense state.
///
/// `save` must detect the case where the loaded version has been superseded
/// by a concurrent writer between load and save, and surface `Conflict`
/// rather than silently overwriting. Implementations bump the aggregate's
/// version on every successful save; the returned copy carries the new
/// version. Saving is idempotent-by-version: for a given expected version it
/// either succeeds once or fails as `Conflict`, never double-applies.
pub trait ExpenseRepository: Send + Sync {
    /// Load the current snapshot by identifier.
    fn load(&self, id: ExpenseId) -> Result<Expense, RepositoryError>;

    /// Persist a new snapshot, enforcing the optimistic-concurrency check.
    fn save(
        &self,
        expense: Expense,
        expected_version: ExpectedVersion,
    ) -> Result<Expense, RepositoryError>;
}

impl<R> ExpenseRepository for Arc<R>
where
    R: ExpenseRepository + ?Sized,
{
    fn load(&self, id: ExpenseId) -> Result<Expense, RepositoryError> {
        (**self).load(id)
    }

    fn save(
        &self,
        expense: Expense,
        expected_version: ExpectedVersion,
    ) -> Result<Expense, RepositoryError> {
        (**self).save(expense, expected_version)
    }
}
