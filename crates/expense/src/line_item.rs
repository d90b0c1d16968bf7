//! Individual expensed costs within a claim.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use claimflow_core::{AttachmentId, DomainError, DomainResult};

/// One expensed cost.
///
/// Amounts are in the smallest currency unit (e.g., cents), so
/// non-negativity holds by construction. Attachment content lives in
/// external storage; only opaque references are carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount: u64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentId>,
}

impl LineItem {
    /// Validate against the caller's notion of "today" (clock-supplied).
    pub fn validate(&self, today: NaiveDate) -> DomainResult<()> {
        if self.date > today {
            return Err(DomainError::validation(format!(
                "line item date {} is in the future",
                self.date
            )));
        }
        Ok(())
    }
}

/// Validate a whole line-item set (order preserved, each item checked).
pub fn validate_line_items(items: &[LineItem], today: NaiveDate) -> DomainResult<()> {
    for item in items {
        item.validate(today)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_on(date: NaiveDate) -> LineItem {
        LineItem {
            amount: 4200,
            date,
            description: Some("taxi to client site".to_string()),
            category: None,
            attachments: vec![],
        }
    }

    #[test]
    fn today_and_past_dates_are_valid() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert!(item_on(today).validate(today).is_ok());
        assert!(item_on(today.pred_opt().unwrap()).validate(today).is_ok());
    }

    #[test]
    fn future_dates_are_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        let err = item_on(tomorrow).validate(today).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
