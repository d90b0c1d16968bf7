//! The expense claim aggregate root.
//!
//! Mutations never happen in place: every operation takes an immutable
//! snapshot and returns a new one. The orchestration layer loads a snapshot,
//! computes the next one through these functions, appends the audit entry,
//! and hands the result to the repository.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use claimflow_audit::{AuditEntry, AuditTrail, FieldSnapshot};
use claimflow_core::{AggregateRoot, DomainError, DomainResult, ExpenseId, OrgId, UserId};

use crate::line_item::{validate_line_items, LineItem};
use crate::state::{ExpenseAction, ExpenseState};

/// Payload for creating a new Draft claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpense {
    pub organization_id: Option<OrgId>,
    pub manager_ids: BTreeSet<UserId>,
    /// Total in smallest currency unit (e.g., cents).
    pub total_amount: u64,
    pub line_items: Vec<LineItem>,
}

/// Payload for Draft-only field changes.
///
/// Absent fields are left untouched; present fields are replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditExpense {
    pub total_amount: Option<u64>,
    pub manager_ids: Option<BTreeSet<UserId>>,
    pub line_items: Option<Vec<LineItem>>,
}

/// Aggregate root: one expense claim and its full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    id: ExpenseId,
    owner_id: UserId,
    organization_id: Option<OrgId>,
    manager_ids: BTreeSet<UserId>,
    total_amount: u64,
    line_items: Vec<LineItem>,
    state: ExpenseState,
    deleted_at: Option<DateTime<Utc>>,
    audit_log: AuditTrail,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Expense {
    /// Construct a new Draft claim owned by `owner_id`.
    ///
    /// Validates the manager-set invariant (organization-scoped claims need
    /// at least one assigned manager) and every line item's date.
    pub fn draft(
        id: ExpenseId,
        owner_id: UserId,
        payload: CreateExpense,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        check_manager_set(payload.organization_id, &payload.manager_ids)?;
        validate_line_items(&payload.line_items, now.date_naive())?;

        Ok(Self {
            id,
            owner_id,
            organization_id: payload.organization_id,
            manager_ids: payload.manager_ids,
            total_amount: payload.total_amount,
            line_items: payload.line_items,
            state: ExpenseState::Draft,
            deleted_at: None,
            audit_log: AuditTrail::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ExpenseId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn organization_id(&self) -> Option<OrgId> {
        self.organization_id
    }

    pub fn manager_ids(&self) -> &BTreeSet<UserId> {
        &self.manager_ids
    }

    pub fn is_manager(&self, user_id: UserId) -> bool {
        self.manager_ids.contains(&user_id)
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn state(&self) -> ExpenseState {
        self.state
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn audit_log(&self) -> &AuditTrail {
        &self.audit_log
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Business rule behind `submit`: a claim cannot leave Draft (or
    /// re-enter the approval flow) without at least one line item.
    pub fn ensure_submittable(&self) -> DomainResult<()> {
        if self.line_items.is_empty() {
            return Err(DomainError::validation(
                "cannot submit an expense without line items",
            ));
        }
        Ok(())
    }

    /// New snapshot in `next` state.
    ///
    /// The caller is responsible for having validated the transition against
    /// the table first; this function only evolves the snapshot.
    pub fn transitioned(&self, next: ExpenseState, now: DateTime<Utc>) -> Self {
        let mut updated = self.clone();
        updated.state = next;
        updated.updated_at = now;
        updated
    }

    /// New snapshot with Draft-only fields replaced.
    ///
    /// `total_amount`, `manager_ids` and `line_items` are mutable only while
    /// the claim is in Draft.
    pub fn edited(&self, edit: &EditExpense, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.state != ExpenseState::Draft {
            return Err(DomainError::invariant(format!(
                "expense fields are only editable in draft (current state: {})",
                self.state
            )));
        }

        let mut updated = self.clone();
        if let Some(total_amount) = edit.total_amount {
            updated.total_amount = total_amount;
        }
        if let Some(manager_ids) = &edit.manager_ids {
            updated.manager_ids = manager_ids.clone();
        }
        if let Some(line_items) = &edit.line_items {
            validate_line_items(line_items, now.date_naive())?;
            updated.line_items = line_items.clone();
        }

        check_manager_set(updated.organization_id, &updated.manager_ids)?;
        updated.updated_at = now;
        Ok(updated)
    }

    /// New snapshot with the soft-delete flag set. State is untouched.
    pub fn soft_deleted(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.deleted_at.is_some() {
            return Err(DomainError::forbidden("expense is already deleted"));
        }
        let mut updated = self.clone();
        updated.deleted_at = Some(now);
        updated.updated_at = now;
        Ok(updated)
    }

    /// New snapshot with the soft-delete flag cleared. State is untouched.
    pub fn restored(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.deleted_at.is_none() {
            return Err(DomainError::validation("expense is not deleted"));
        }
        let mut updated = self.clone();
        updated.deleted_at = None;
        updated.updated_at = now;
        Ok(updated)
    }

    /// Append an audit entry. The only way the log grows.
    pub fn recorded(mut self, entry: AuditEntry) -> Self {
        self.audit_log.append(entry);
        self
    }

    /// Replace the version token. Reserved for the repository, which bumps
    /// it on every successful save.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Capture the named fields as a JSON snapshot for audit diffing.
    pub fn snapshot(&self, fields: &[&str]) -> FieldSnapshot {
        let mut out = FieldSnapshot::new();
        for &field in fields {
            let value = match field {
                "state" => to_json(&self.state),
                "total_amount" => to_json(&self.total_amount),
                "manager_ids" => to_json(&self.manager_ids),
                "line_items" => to_json(&self.line_items),
                "deleted_at" => to_json(&self.deleted_at),
                "organization_id" => to_json(&self.organization_id),
                _ => continue,
            };
            out.insert(field.to_string(), value);
        }
        out
    }

    /// The fields a successful action touches, for audit snapshotting.
    pub fn touched_fields(action: ExpenseAction) -> &'static [&'static str] {
        match action {
            ExpenseAction::Submit
            | ExpenseAction::Approve
            | ExpenseAction::Reject
            | ExpenseAction::Reimburse => &["state"],
            ExpenseAction::Edit => &["total_amount", "manager_ids", "line_items"],
            ExpenseAction::Delete | ExpenseAction::Restore => &["deleted_at"],
        }
    }

    /// Fields captured in the `created` audit entry.
    pub const CREATED_FIELDS: &'static [&'static str] = &[
        "state",
        "organization_id",
        "manager_ids",
        "total_amount",
        "line_items",
    ];

    /// Post-mutation structural invariants.
    ///
    /// Checked by the orchestration layer after every apply; a violation here
    /// means a bug in a mutation function, not bad caller input.
    pub fn check_invariants(&self) -> DomainResult<()> {
        if self.state != ExpenseState::Draft && self.line_items.is_empty() {
            return Err(DomainError::invariant(format!(
                "line items must be non-empty outside draft (state: {})",
                self.state
            )));
        }
        check_manager_set(self.organization_id, &self.manager_ids)?;
        if !self.audit_log.is_chronological() {
            return Err(DomainError::invariant(
                "audit log dates must be non-decreasing",
            ));
        }
        Ok(())
    }
}

impl AggregateRoot for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn check_manager_set(
    organization_id: Option<OrgId>,
    manager_ids: &BTreeSet<UserId>,
) -> DomainResult<()> {
    if organization_id.is_some() && manager_ids.is_empty() {
        return Err(DomainError::validation(
            "organization-scoped expenses need at least one assigned manager",
        ));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}
