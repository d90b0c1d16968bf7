//! Before/after diffing for audit entries.
//!
//! The caller snapshots the fields an action is about to touch, applies the
//! mutation, snapshots the same fields again, and hands both maps here. The
//! recorder keeps only the fields whose values actually changed, so a pure
//! state transition ends up with a one-key diff (`state`) and an edit with
//! exactly the edited fields.

use chrono::{DateTime, Utc};

use claimflow_core::UserId;

use crate::entry::{AuditAction, AuditEntry, FieldSnapshot};

/// Restrict two snapshots to the fields whose values differ.
///
/// Returns `(previous_values, updated_values)`; either side is `None` when
/// nothing remains after filtering (pure informational entry). A field present
/// on only one side counts as changed.
pub fn diff(
    before: &FieldSnapshot,
    after: &FieldSnapshot,
) -> (Option<FieldSnapshot>, Option<FieldSnapshot>) {
    let mut previous = FieldSnapshot::new();
    let mut updated = FieldSnapshot::new();

    for (field, old) in before {
        match after.get(field) {
            Some(new) if new == old => {}
            Some(new) => {
                previous.insert(field.clone(), old.clone());
                updated.insert(field.clone(), new.clone());
            }
            None => {
                previous.insert(field.clone(), old.clone());
            }
        }
    }

    for (field, new) in after {
        if !before.contains_key(field) {
            updated.insert(field.clone(), new.clone());
        }
    }

    (
        (!previous.is_empty()).then_some(previous),
        (!updated.is_empty()).then_some(updated),
    )
}

/// Build the audit entry for one mutation.
///
/// Pure: the timestamp comes from the caller's clock, and the snapshots are
/// diffed without touching the aggregate.
pub fn build_entry(
    action: AuditAction,
    actor_id: UserId,
    at: DateTime<Utc>,
    before: &FieldSnapshot,
    after: &FieldSnapshot,
    comment: Option<String>,
) -> AuditEntry {
    let (previous_values, updated_values) = diff(before, after);
    AuditEntry {
        action,
        date: at,
        actor_id,
        previous_values,
        updated_values,
        comment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(pairs: &[(&str, serde_json::Value)]) -> FieldSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn diff_keeps_only_changed_fields() {
        let before = snapshot(&[
            ("state", json!("draft")),
            ("total_amount", json!(12000)),
        ]);
        let after = snapshot(&[
            ("state", json!("pre_approval_pending")),
            ("total_amount", json!(12000)),
        ]);

        let (prev, updated) = diff(&before, &after);
        assert_eq!(prev, Some(snapshot(&[("state", json!("draft"))])));
        assert_eq!(
            updated,
            Some(snapshot(&[("state", json!("pre_approval_pending"))]))
        );
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let fields = snapshot(&[("state", json!("draft"))]);
        let (prev, updated) = diff(&fields, &fields.clone());
        assert_eq!(prev, None);
        assert_eq!(updated, None);
    }

    #[test]
    fn field_present_on_one_side_counts_as_changed() {
        let before = snapshot(&[("deleted_at", json!(null))]);
        let after = snapshot(&[
            ("deleted_at", json!("2026-01-05T10:00:00Z")),
            ("state", json!("draft")),
        ]);

        let (prev, updated) = diff(&before, &after);
        assert_eq!(prev, Some(snapshot(&[("deleted_at", json!(null))])));
        let updated = updated.unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.contains_key("state"));
    }

    #[test]
    fn build_entry_carries_actor_timestamp_and_comment() {
        let actor = UserId::new();
        let at = Utc::now();
        let before = snapshot(&[("state", json!("approved"))]);
        let after = snapshot(&[("state", json!("reimbursed"))]);

        let entry = build_entry(
            AuditAction::Reimbursed,
            actor,
            at,
            &before,
            &after,
            Some("paid via payroll run".to_string()),
        );

        assert_eq!(entry.action, AuditAction::Reimbursed);
        assert_eq!(entry.actor_id, actor);
        assert_eq!(entry.date, at);
        assert_eq!(entry.comment.as_deref(), Some("paid via payroll run"));
        assert!(entry.previous_values.is_some());
        assert!(entry.updated_values.is_some());
    }
}
