//! The authorization guard: actor-class based allow/deny decisions.
//!
//! - No IO (directory facts are injected)
//! - No panics
//! - No state-machine logic (transition validity is checked elsewhere)

use thiserror::Error;

use claimflow_core::UserId;
use claimflow_expense::{Expense, ExpenseAction};

use crate::directory::Directory;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthzError {
    fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// Decide whether `actor_id` may perform `action` on `expense`.
///
/// Actor classes:
/// - **owner**: submit, edit, delete, restore
/// - **assigned manager**: approve, reject (org membership required for
///   organization-scoped claims)
/// - **org admin/owner**: reimburse, even without a manager assignment
///
/// Self-review is always denied: an owner never approves, rejects, or
/// reimburses their own claim, whatever roles they also hold.
pub fn authorize<D>(
    directory: &D,
    actor_id: UserId,
    expense: &Expense,
    action: ExpenseAction,
) -> Result<(), AuthzError>
where
    D: Directory + ?Sized,
{
    match action {
        ExpenseAction::Submit | ExpenseAction::Edit | ExpenseAction::Delete
        | ExpenseAction::Restore => {
            if actor_id != expense.owner_id() {
                return Err(AuthzError::forbidden(format!(
                    "only the owner may {action} this expense"
                )));
            }
            Ok(())
        }

        ExpenseAction::Approve | ExpenseAction::Reject => {
            deny_self_review(actor_id, expense, action)?;
            require_manager_with_membership(directory, actor_id, expense, action)
        }

        ExpenseAction::Reimburse => {
            deny_self_review(actor_id, expense, action)?;

            // Org admins/owners may reimburse without a manager assignment.
            // The manager path keeps its own membership check even though it
            // is redundant for admins; both routes are kept as-is.
            if let Some(org_id) = expense.organization_id() {
                if directory
                    .role(org_id, actor_id)
                    .is_some_and(|role| role.can_reimburse())
                {
                    return Ok(());
                }
            }

            require_manager_with_membership(directory, actor_id, expense, action)
        }
    }
}

fn deny_self_review(
    actor_id: UserId,
    expense: &Expense,
    action: ExpenseAction,
) -> Result<(), AuthzError> {
    if actor_id == expense.owner_id() {
        return Err(AuthzError::forbidden(format!(
            "owners may not {action} their own expense"
        )));
    }
    Ok(())
}

fn require_manager_with_membership<D>(
    directory: &D,
    actor_id: UserId,
    expense: &Expense,
    action: ExpenseAction,
) -> Result<(), AuthzError>
where
    D: Directory + ?Sized,
{
    if !expense.is_manager(actor_id) {
        return Err(AuthzError::forbidden(format!(
            "only an assigned manager may {action} this expense"
        )));
    }

    if let Some(org_id) = expense.organization_id() {
        if !directory.is_member(org_id, actor_id) {
            return Err(AuthzError::forbidden(format!(
                "manager is not a member of the expense's organization ({org_id})"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::collections::HashMap;

    use chrono::{NaiveDate, Utc};

    use claimflow_core::{ExpenseId, OrgId};
    use claimflow_expense::{CreateExpense, ExpenseState, LineItem};

    use crate::roles::OrgRole;

    /// Map-backed directory stub for guard tests.
    #[derive(Debug, Default)]
    struct StubDirectory {
        roles: HashMap<(OrgId, UserId), OrgRole>,
    }

    impl StubDirectory {
        fn with(mut self, org: OrgId, user: UserId, role: OrgRole) -> Self {
            self.roles.insert((org, user), role);
            self
        }
    }

    impl Directory for StubDirectory {
        fn is_member(&self, org_id: OrgId, user_id: UserId) -> bool {
            self.roles.contains_key(&(org_id, user_id))
        }

        fn role(&self, org_id: OrgId, user_id: UserId) -> Option<OrgRole> {
            self.roles.get(&(org_id, user_id)).copied()
        }
    }

    fn line_item() -> LineItem {
        LineItem {
            amount: 12000,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            description: None,
            category: None,
            attachments: vec![],
        }
    }

    fn claim(owner: UserId, manager: UserId, org: Option<OrgId>, state: ExpenseState) -> Expense {
        let draft = Expense::draft(
            ExpenseId::new(),
            owner,
            CreateExpense {
                organization_id: org,
                manager_ids: BTreeSet::from([manager]),
                total_amount: 12000,
                line_items: vec![line_item()],
            },
            Utc::now(),
        )
        .unwrap();
        draft.transitioned(state, Utc::now())
    }

    #[test]
    fn owner_may_submit_others_may_not() {
        let owner = UserId::new();
        let manager = UserId::new();
        let expense = claim(owner, manager, None, ExpenseState::Draft);
        let directory = StubDirectory::default();

        assert!(authorize(&directory, owner, &expense, ExpenseAction::Submit).is_ok());
        assert!(authorize(&directory, manager, &expense, ExpenseAction::Submit).is_err());
    }

    #[test]
    fn assigned_manager_may_approve_personal_claim() {
        let owner = UserId::new();
        let manager = UserId::new();
        let expense = claim(owner, manager, None, ExpenseState::PreApprovalPending);
        let directory = StubDirectory::default();

        assert!(authorize(&directory, manager, &expense, ExpenseAction::Approve).is_ok());
        assert!(authorize(&directory, UserId::new(), &expense, ExpenseAction::Approve).is_err());
    }

    #[test]
    fn org_manager_needs_current_membership() {
        let owner = UserId::new();
        let manager = UserId::new();
        let org = OrgId::new();
        let expense = claim(owner, manager, Some(org), ExpenseState::PreApprovalPending);

        // Assigned but no longer a member: denied.
        let empty = StubDirectory::default();
        assert!(authorize(&empty, manager, &expense, ExpenseAction::Approve).is_err());

        let with_membership = StubDirectory::default().with(org, manager, OrgRole::Member);
        assert!(authorize(&with_membership, manager, &expense, ExpenseAction::Approve).is_ok());
    }

    #[test]
    fn self_review_is_denied_for_every_review_action() {
        let owner = UserId::new();
        let org = OrgId::new();
        // Owner is also assigned manager and org admin: still denied.
        let expense = claim(owner, owner, Some(org), ExpenseState::Approved);
        let directory = StubDirectory::default().with(org, owner, OrgRole::Admin);

        for action in [
            ExpenseAction::Approve,
            ExpenseAction::Reject,
            ExpenseAction::Reimburse,
        ] {
            let err = authorize(&directory, owner, &expense, action).unwrap_err();
            assert!(matches!(err, AuthzError::Forbidden(_)), "{action} allowed");
        }
    }

    #[test]
    fn org_admin_may_reimburse_without_manager_assignment() {
        let owner = UserId::new();
        let manager = UserId::new();
        let admin = UserId::new();
        let org = OrgId::new();
        let expense = claim(owner, manager, Some(org), ExpenseState::Approved);

        let directory = StubDirectory::default()
            .with(org, manager, OrgRole::Member)
            .with(org, admin, OrgRole::Admin);

        assert!(authorize(&directory, admin, &expense, ExpenseAction::Reimburse).is_ok());

        // A plain member without assignment stays denied.
        let member = UserId::new();
        let directory = directory.with(org, member, OrgRole::Member);
        assert!(authorize(&directory, member, &expense, ExpenseAction::Reimburse).is_err());
    }

    #[test]
    fn personal_claim_is_reimbursed_by_its_assigned_manager() {
        let owner = UserId::new();
        let manager = UserId::new();
        let expense = claim(owner, manager, None, ExpenseState::Approved);
        let directory = StubDirectory::default();

        assert!(authorize(&directory, manager, &expense, ExpenseAction::Reimburse).is_ok());
    }

    #[test]
    fn only_the_owner_may_delete_or_restore() {
        let owner = UserId::new();
        let manager = UserId::new();
        let expense = claim(owner, manager, None, ExpenseState::Draft);
        let directory = StubDirectory::default();

        for action in [ExpenseAction::Delete, ExpenseAction::Restore] {
            assert!(authorize(&directory, owner, &expense, action).is_ok());
            assert!(authorize(&directory, manager, &expense, action).is_err());
        }
    }
}
