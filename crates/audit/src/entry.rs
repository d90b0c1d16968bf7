//! Audit entries and the append-only trail they live in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use claimflow_core::UserId;

/// Partial field-name → value mapping, restricted to the fields a single
/// mutation touched.
pub type FieldSnapshot = BTreeMap<String, JsonValue>;

/// The named operation that produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Submitted,
    Approved,
    Rejected,
    Reimbursed,
    Deleted,
    Restored,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Submitted => "submitted",
            AuditAction::Approved => "approved",
            AuditAction::Rejected => "rejected",
            AuditAction::Reimbursed => "reimbursed",
            AuditAction::Deleted => "deleted",
            AuditAction::Restored => "restored",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical fact: who did what, when, and which fields changed.
///
/// Entries are immutable once appended. `previous_values`/`updated_values`
/// are omitted entirely for pure informational entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub date: DateTime<Utc>,
    pub actor_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<FieldSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_values: Option<FieldSnapshot>,
    /// Free-text caller comment. Stored verbatim; never consulted by
    /// authorization or transition logic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Append-only, chronologically ordered sequence of audit entries.
///
/// The only mutating operation is [`AuditTrail::append`]; existing entries
/// cannot be reordered, edited, or removed through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry. Insertion order is chronological order.
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, AuditEntry> {
        self.entries.iter()
    }

    /// True when entry dates are non-decreasing in insertion order.
    pub fn is_chronological(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a AuditEntry;
    type IntoIter = core::slice::Iter<'a, AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
