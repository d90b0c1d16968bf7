//! `claimflow-audit` — immutable, diffable mutation history.
//!
//! Every successful mutation of an expense appends exactly one [`AuditEntry`]
//! to its trail; entries are never edited or removed afterwards.

pub mod entry;
pub mod recorder;

pub use entry::{AuditAction, AuditEntry, AuditTrail, FieldSnapshot};
pub use recorder::{build_entry, diff};
