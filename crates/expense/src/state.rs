//! Expense lifecycle states and the authoritative transition table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use claimflow_audit::AuditAction;

/// Expense claim lifecycle.
///
/// `Reimbursed` is the terminal state of the successful path. `Rejected` is
/// not terminal: a rejected claim may be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseState {
    Draft,
    PreApprovalPending,
    PreApproved,
    ApprovalPending,
    Approved,
    Rejected,
    Reimbursed,
}

impl ExpenseState {
    pub const ALL: [ExpenseState; 7] = [
        ExpenseState::Draft,
        ExpenseState::PreApprovalPending,
        ExpenseState::PreApproved,
        ExpenseState::ApprovalPending,
        ExpenseState::Approved,
        ExpenseState::Rejected,
        ExpenseState::Reimbursed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseState::Draft => "draft",
            ExpenseState::PreApprovalPending => "pre_approval_pending",
            ExpenseState::PreApproved => "pre_approved",
            ExpenseState::ApprovalPending => "approval_pending",
            ExpenseState::Approved => "approved",
            ExpenseState::Rejected => "rejected",
            ExpenseState::Reimbursed => "reimbursed",
        }
    }
}

impl core::fmt::Display for ExpenseState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The actions a caller can request against an expense.
///
/// `Submit`, `Approve`, `Reject` and `Reimburse` are state transitions.
/// `Delete` and `Restore` toggle the soft-delete flag independent of state,
/// and `Edit` is a Draft-only field change; none of the three appears in the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseAction {
    Submit,
    Approve,
    Reject,
    Reimburse,
    Delete,
    Restore,
    Edit,
}

impl ExpenseAction {
    pub const ALL: [ExpenseAction; 7] = [
        ExpenseAction::Submit,
        ExpenseAction::Approve,
        ExpenseAction::Reject,
        ExpenseAction::Reimburse,
        ExpenseAction::Delete,
        ExpenseAction::Restore,
        ExpenseAction::Edit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseAction::Submit => "submit",
            ExpenseAction::Approve => "approve",
            ExpenseAction::Reject => "reject",
            ExpenseAction::Reimburse => "reimburse",
            ExpenseAction::Delete => "delete",
            ExpenseAction::Restore => "restore",
            ExpenseAction::Edit => "edit",
        }
    }

    /// True for the actions governed by the transition table.
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            ExpenseAction::Submit
                | ExpenseAction::Approve
                | ExpenseAction::Reject
                | ExpenseAction::Reimburse
        )
    }

    /// The audit action recorded when this request succeeds.
    pub fn audit_action(&self) -> AuditAction {
        match self {
            ExpenseAction::Submit => AuditAction::Submitted,
            ExpenseAction::Approve => AuditAction::Approved,
            ExpenseAction::Reject => AuditAction::Rejected,
            ExpenseAction::Reimburse => AuditAction::Reimbursed,
            ExpenseAction::Delete => AuditAction::Deleted,
            ExpenseAction::Restore => AuditAction::Restored,
            ExpenseAction::Edit => AuditAction::Updated,
        }
    }
}

impl core::fmt::Display for ExpenseAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action was requested from a state not listed in its table row.
///
/// This is an expected, recoverable outcome (a sub-kind of Forbidden), not a
/// system error; it carries the attempted action and source state for
/// diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("action '{action}' is not legal from state '{state}'")]
pub struct TransitionError {
    pub action: ExpenseAction,
    pub state: ExpenseState,
}

/// The authoritative transition table.
///
/// Single source of truth for which action moves an expense between which
/// states: adding an action means adding a row here, not editing call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMachine;

impl StateMachine {
    /// Destination state for `(state, action)`, or `None` when the pair is
    /// not in the table.
    ///
    /// `submit` is the only action whose destination depends on the current
    /// state: resubmission lands back at the first tier until the claim is
    /// pre-approved, then proceeds to final approval.
    pub fn destination(state: ExpenseState, action: ExpenseAction) -> Option<ExpenseState> {
        use ExpenseAction::*;
        use ExpenseState::*;

        match (action, state) {
            (Submit, Draft) => Some(PreApprovalPending),
            (Submit, Rejected) => Some(PreApprovalPending),
            (Submit, PreApproved) => Some(ApprovalPending),

            (Approve, PreApprovalPending) => Some(PreApproved),
            (Approve, ApprovalPending) => Some(Approved),

            (Reject, PreApprovalPending) => Some(Rejected),
            (Reject, PreApproved) => Some(Rejected),
            (Reject, ApprovalPending) => Some(Rejected),

            (Reimburse, Approved) => Some(Reimbursed),

            _ => None,
        }
    }

    /// Validate a requested transition, yielding the destination state.
    pub fn validate(
        state: ExpenseState,
        action: ExpenseAction,
    ) -> Result<ExpenseState, TransitionError> {
        Self::destination(state, action).ok_or(TransitionError { action, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn submit_destination_depends_on_source() {
        assert_eq!(
            StateMachine::validate(ExpenseState::Draft, ExpenseAction::Submit),
            Ok(ExpenseState::PreApprovalPending)
        );
        assert_eq!(
            StateMachine::validate(ExpenseState::PreApproved, ExpenseAction::Submit),
            Ok(ExpenseState::ApprovalPending)
        );
        assert_eq!(
            StateMachine::validate(ExpenseState::Rejected, ExpenseAction::Submit),
            Ok(ExpenseState::PreApprovalPending)
        );
    }

    #[test]
    fn approval_is_two_tiered() {
        assert_eq!(
            StateMachine::validate(ExpenseState::PreApprovalPending, ExpenseAction::Approve),
            Ok(ExpenseState::PreApproved)
        );
        assert_eq!(
            StateMachine::validate(ExpenseState::ApprovalPending, ExpenseAction::Approve),
            Ok(ExpenseState::Approved)
        );
    }

    #[test]
    fn reject_is_legal_from_every_pending_tier() {
        for state in [
            ExpenseState::PreApprovalPending,
            ExpenseState::PreApproved,
            ExpenseState::ApprovalPending,
        ] {
            assert_eq!(
                StateMachine::validate(state, ExpenseAction::Reject),
                Ok(ExpenseState::Rejected)
            );
        }
    }

    #[test]
    fn reimbursed_is_terminal() {
        for action in ExpenseAction::ALL.iter().filter(|a| a.is_transition()) {
            assert!(StateMachine::destination(ExpenseState::Reimbursed, *action).is_none());
        }
    }

    #[test]
    fn non_transition_actions_are_never_in_the_table() {
        for state in ExpenseState::ALL {
            for action in [
                ExpenseAction::Delete,
                ExpenseAction::Restore,
                ExpenseAction::Edit,
            ] {
                assert!(StateMachine::destination(state, action).is_none());
            }
        }
    }

    fn in_table(state: ExpenseState, action: ExpenseAction) -> bool {
        use ExpenseAction::*;
        use ExpenseState::*;
        matches!(
            (action, state),
            (Submit, Draft)
                | (Submit, Rejected)
                | (Submit, PreApproved)
                | (Approve, PreApprovalPending)
                | (Approve, ApprovalPending)
                | (Reject, PreApprovalPending)
                | (Reject, PreApproved)
                | (Reject, ApprovalPending)
                | (Reimburse, Approved)
        )
    }

    proptest! {
        // Every (state, action) pair outside the table must be rejected with
        // an error naming the attempted action and source state.
        #[test]
        fn off_table_pairs_are_rejected(
            state_idx in 0usize..ExpenseState::ALL.len(),
            action_idx in 0usize..ExpenseAction::ALL.len(),
        ) {
            let state = ExpenseState::ALL[state_idx];
            let action = ExpenseAction::ALL[action_idx];

            match StateMachine::validate(state, action) {
                Ok(_) => prop_assert!(in_table(state, action)),
                Err(err) => {
                    prop_assert!(!in_table(state, action));
                    prop_assert_eq!(err.action, action);
                    prop_assert_eq!(err.state, state);
                }
            }
        }
    }
}
