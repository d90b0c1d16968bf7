//! Action execution pipeline (application-level orchestration).
//!
//! The `ActionDispatcher` runs every mutation through the same sequence:
//!
//! ```text
//! request(expense_id, actor_id, command, comment)
//!   ↓
//! 1. Load the current snapshot from the repository
//!   ↓
//! 2. Deleted-claim guard (only restore touches a soft-deleted claim)
//!   ↓
//! 3. Authorization guard (actor-class check, pure)
//!   ↓
//! 4. Transition table + business rules (pure)
//!   ↓
//! 5. Compute the new snapshot and its audit entry (pure)
//!   ↓
//! 6. Persist with the optimistic-concurrency check
//! ```
//!
//! No step before 6 performs IO besides the initial load, and no mutation
//! succeeds without its audit entry: the entry is appended to the snapshot
//! before the single `save`, so both land atomically or not at all.
//!
//! There is no distributed lock anywhere in this pipeline. Concurrency
//! correctness rests entirely on the repository's version check: of two
//! requests racing on the same expense, the second writer observes a version
//! mismatch and gets `Conflict`, which callers should treat as
//! reload-and-retry.

use thiserror::Error;

use claimflow_audit::{build_entry, AuditAction, FieldSnapshot};
use claimflow_auth::{authorize, AuthzError, Directory};
use claimflow_core::{
    AggregateRoot, Clock, DomainError, ExpectedVersion, ExpenseId, UserId,
};
use claimflow_expense::{
    CreateExpense, EditExpense, Expense, ExpenseAction, ExpenseState, StateMachine,
    TransitionError,
};

use crate::repository::{ExpenseRepository, RepositoryError};

/// A caller's intent: an action name plus its payload, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseCommand {
    Submit,
    Approve,
    Reject,
    Reimburse,
    Delete,
    Restore,
    Edit(EditExpense),
}

impl ExpenseCommand {
    pub fn action(&self) -> ExpenseAction {
        match self {
            ExpenseCommand::Submit => ExpenseAction::Submit,
            ExpenseCommand::Approve => ExpenseAction::Approve,
            ExpenseCommand::Reject => ExpenseAction::Reject,
            ExpenseCommand::Reimburse => ExpenseAction::Reimburse,
            ExpenseCommand::Delete => ExpenseAction::Delete,
            ExpenseCommand::Restore => ExpenseAction::Restore,
            ExpenseCommand::Edit(_) => ExpenseAction::Edit,
        }
    }
}

/// Typed failure returned by the dispatcher.
///
/// Everything except `Storage` is an expected, recoverable outcome, not a
/// crash. `Conflict` should prompt the caller to reload and retry.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("expense not found")]
    NotFound,

    /// No authenticated actor was supplied.
    #[error("unauthorized")]
    Unauthorized,

    /// The actor lacks permission for this action on this expense (including
    /// the self-approval prohibition and the deleted-claim guard).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The action is not legal from the current state. A sub-kind of
    /// Forbidden, surfaced with the attempted action and source state.
    #[error("action '{action}' is not legal from state '{state}'")]
    ForbiddenTransition {
        action: ExpenseAction,
        state: ExpenseState,
    },

    /// Payload or business-rule violation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Concurrent modification detected by the repository.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure, kept distinct from the business taxonomy.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DispatchError {
    /// True when the caller should reload and retry rather than give up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Conflict(_))
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::Validation(msg),
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::Forbidden(msg) => DispatchError::Forbidden(msg),
            DomainError::Unauthorized => DispatchError::Unauthorized,
        }
    }
}

impl From<AuthzError> for DispatchError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(msg) => DispatchError::Forbidden(msg),
        }
    }
}

impl From<TransitionError> for DispatchError {
    fn from(value: TransitionError) -> Self {
        DispatchError::ForbiddenTransition {
            action: value.action,
            state: value.state,
        }
    }
}

impl From<RepositoryError> for DispatchError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => DispatchError::NotFound,
            RepositoryError::Conflict(msg) => DispatchError::Conflict(msg),
            RepositoryError::Storage(msg) => DispatchError::Storage(msg),
        }
    }
}

/// Orchestration entry point for all expense mutations.
#[derive(Debug)]
pub struct ActionDispatcher<R, D, C> {
    repository: R,
    directory: D,
    clock: C,
}

impl<R, D, C> ActionDispatcher<R, D, C> {
    pub fn new(repository: R, directory: D, clock: C) -> Self {
        Self {
            repository,
            directory,
            clock,
        }
    }

    pub fn into_parts(self) -> (R, D, C) {
        (self.repository, self.directory, self.clock)
    }
}

impl<R, D, C> ActionDispatcher<R, D, C>
where
    R: ExpenseRepository,
    D: Directory,
    C: Clock,
{
    /// Create a new Draft claim owned by `actor_id`.
    ///
    /// The `created` audit entry captures the initial field values; the
    /// aggregate is persisted expecting version 0 (no prior writer).
    pub fn create(
        &self,
        actor_id: UserId,
        payload: CreateExpense,
        comment: Option<String>,
    ) -> Result<Expense, DispatchError> {
        require_actor(actor_id)?;

        let now = self.clock.now();
        let draft = Expense::draft(ExpenseId::new(), actor_id, payload, now)?;

        let before = FieldSnapshot::new();
        let after = draft.snapshot(Expense::CREATED_FIELDS);
        let entry = build_entry(AuditAction::Created, actor_id, now, &before, &after, comment);
        let draft = draft.recorded(entry);
        draft.check_invariants()?;

        let saved = self.repository.save(draft, ExpectedVersion::Exact(0))?;
        tracing::info!(
            expense_id = %saved.id_typed(),
            actor_id = %actor_id,
            "expense created"
        );
        Ok(saved)
    }

    /// Execute one action against an existing expense.
    pub fn dispatch(
        &self,
        expense_id: ExpenseId,
        actor_id: UserId,
        command: ExpenseCommand,
        comment: Option<String>,
    ) -> Result<Expense, DispatchError> {
        require_actor(actor_id)?;

        let expense = self.repository.load(expense_id)?;
        let action = command.action();

        // A soft-deleted claim accepts nothing but restore.
        if expense.is_deleted() && action != ExpenseAction::Restore {
            tracing::debug!(
                expense_id = %expense_id,
                actor_id = %actor_id,
                action = %action,
                "action denied on deleted expense"
            );
            return Err(DispatchError::Forbidden("expense is deleted".to_string()));
        }

        authorize(&self.directory, actor_id, &expense, action)?;

        let now = self.clock.now();
        let before = expense.snapshot(Expense::touched_fields(action));

        let updated = match &command {
            ExpenseCommand::Submit => {
                let next = StateMachine::validate(expense.state(), action)?;
                expense.ensure_submittable()?;
                expense.transitioned(next, now)
            }
            ExpenseCommand::Approve | ExpenseCommand::Reject | ExpenseCommand::Reimburse => {
                let next = StateMachine::validate(expense.state(), action)?;
                expense.transitioned(next, now)
            }
            ExpenseCommand::Delete => expense.soft_deleted(now)?,
            ExpenseCommand::Restore => expense.restored(now)?,
            ExpenseCommand::Edit(edit) => expense.edited(edit, now)?,
        };

        let after = updated.snapshot(Expense::touched_fields(action));
        let entry = build_entry(action.audit_action(), actor_id, now, &before, &after, comment);
        let updated = updated.recorded(entry);
        updated.check_invariants()?;

        let saved = self
            .repository
            .save(updated, ExpectedVersion::Exact(expense.version()))?;

        tracing::info!(
            expense_id = %expense_id,
            actor_id = %actor_id,
            action = %action,
            state = %saved.state(),
            "expense action applied"
        );
        Ok(saved)
    }

    /// The actions `actor_id` could successfully request right now.
    ///
    /// Read-only (for UIs deciding which buttons to show); derived from the
    /// same guard and table the dispatch path uses, without mutating
    /// anything.
    pub fn valid_actions(&self, expense: &Expense, actor_id: UserId) -> Vec<ExpenseAction> {
        if actor_id.is_nil() {
            return Vec::new();
        }

        ExpenseAction::ALL
            .into_iter()
            .filter(|&action| self.is_valid(expense, actor_id, action))
            .collect()
    }

    fn is_valid(&self, expense: &Expense, actor_id: UserId, action: ExpenseAction) -> bool {
        // Deleted claims accept only restore; live ones everything but.
        if expense.is_deleted() != (action == ExpenseAction::Restore) {
            return false;
        }

        if authorize(&self.directory, actor_id, expense, action).is_err() {
            return false;
        }

        match action {
            ExpenseAction::Submit => {
                StateMachine::destination(expense.state(), action).is_some()
                    && expense.ensure_submittable().is_ok()
            }
            ExpenseAction::Approve | ExpenseAction::Reject | ExpenseAction::Reimburse => {
                StateMachine::destination(expense.state(), action).is_some()
            }
            ExpenseAction::Edit => expense.state() == ExpenseState::Draft,
            ExpenseAction::Delete => !expense.is_deleted(),
            ExpenseAction::Restore => expense.is_deleted(),
        }
    }
}

fn require_actor(actor_id: UserId) -> Result<(), DispatchError> {
    if actor_id.is_nil() {
        return Err(DispatchError::Unauthorized);
    }
    Ok(())
}
