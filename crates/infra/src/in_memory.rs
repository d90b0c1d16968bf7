//! In-memory adapters.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;

use claimflow_auth::{Directory, OrgRole};
use claimflow_core::{AggregateRoot, ExpectedVersion, ExpenseId, OrgId, UserId};
use claimflow_expense::Expense;

use crate::repository::{ExpenseRepository, RepositoryError};

/// In-memory snapshot store with optimistic concurrency.
#[derive(Debug, Default)]
pub struct InMemoryExpenseRepository {
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExpenseRepository for InMemoryExpenseRepository {
    fn load(&self, id: ExpenseId) -> Result<Expense, RepositoryError> {
        let expenses = self
            .expenses
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        expenses.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    fn save(
        &self,
        expense: Expense,
        expected_version: ExpectedVersion,
    ) -> Result<Expense, RepositoryError> {
        let mut expenses = self
            .expenses
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        // Version check and insert happen under one write lock: of two
        // writers racing from the same loaded version, exactly one wins.
        let current = expenses
            .get(&expense.id_typed())
            .map(|stored| stored.version())
            .unwrap_or(0);

        if !expected_version.matches(current) {
            return Err(RepositoryError::Conflict(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        let saved = expense.with_version(current + 1);
        expenses.insert(saved.id_typed(), saved.clone());
        Ok(saved)
    }
}

/// In-memory membership/role directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    roles: RwLock<HashMap<(OrgId, UserId), OrgRole>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `user_id` a role in `org_id` (replacing any existing one).
    pub fn grant(&self, org_id: OrgId, user_id: UserId, role: OrgRole) {
        let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
        roles.insert((org_id, user_id), role);
    }

    /// Remove the user from the organization.
    pub fn revoke(&self, org_id: OrgId, user_id: UserId) {
        let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
        roles.remove(&(org_id, user_id));
    }
}

impl Directory for InMemoryDirectory {
    fn is_member(&self, org_id: OrgId, user_id: UserId) -> bool {
        let roles = self.roles.read().unwrap_or_else(|e| e.into_inner());
        roles.contains_key(&(org_id, user_id))
    }

    fn role(&self, org_id: OrgId, user_id: UserId) -> Option<OrgRole> {
        let roles = self.roles.read().unwrap_or_else(|e| e.into_inner());
        roles.get(&(org_id, user_id)).copied()
    }
}
