//! CSV column detection and mapping.
//!
//! Headers are classified case-insensitively:
//! - date: contains `date`
//! - description: contains `desc`, `memo`, `detail`, or `narr`
//! - amount: contains `amount`, `amt`, `value`, `debit`, or `credit`
//!
//! A header is assigned the first role it qualifies for, in that order.

use serde::{Deserialize, Serialize};

use super::error::ReconciliationError;

const DESCRIPTION_HINTS: [&str; 4] = ["desc", "memo", "detail", "narr"];
const AMOUNT_HINTS: [&str; 5] = ["amount", "amt", "value", "debit", "credit"];

/// Role a CSV column plays in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    /// Transaction date.
    Date,
    /// Transaction description.
    Description,
    /// Signed amount.
    Amount,
}

/// Classifies a header by name.
#[must_use]
pub fn role_of(header: &str) -> Option<ColumnRole> {
    let lower = header.trim().to_lowercase();
    if lower.contains("date") {
        Some(ColumnRole::Date)
    } else if DESCRIPTION_HINTS.iter().any(|h| lower.contains(h)) {
        Some(ColumnRole::Description)
    } else if AMOUNT_HINTS.iter().any(|h| lower.contains(h)) {
        Some(ColumnRole::Amount)
    } else {
        None
    }
}

/// Header names chosen for each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Date column header.
    pub date: String,
    /// Description column header.
    pub description: String,
    /// Amount column header.
    pub amount: String,
}

/// Column indexes resolved from a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Date column index.
    pub date: usize,
    /// Description column index.
    pub description: usize,
    /// Amount column index.
    pub amount: usize,
}

impl ColumnMapping {
    /// Resolves header names to column indexes.
    ///
    /// Names compare case-insensitively after trimming.
    ///
    /// # Errors
    ///
    /// Returns `ColumnMapping` if a name is missing, matches several
    /// headers, or two roles share a column.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns, ReconciliationError> {
        let find = |role: &str, name: &str| -> Result<usize, ReconciliationError> {
            let wanted = name.trim().to_lowercase();
            if wanted.is_empty() {
                return Err(ReconciliationError::ColumnMapping(format!(
                    "no column selected for {role}"
                )));
            }
            let mut hits = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| h.trim().to_lowercase() == wanted)
                .map(|(i, _)| i);
            match (hits.next(), hits.next()) {
                (Some(index), None) => Ok(index),
                (None, _) => Err(ReconciliationError::ColumnMapping(format!(
                    "column '{name}' for {role} not found"
                ))),
                (Some(_), Some(_)) => Err(ReconciliationError::ColumnMapping(format!(
                    "column '{name}' for {role} is ambiguous"
                ))),
            }
        };

        let resolved = ResolvedColumns {
            date: find("date", &self.date)?,
            description: find("description", &self.description)?,
            amount: find("amount", &self.amount)?,
        };

        if resolved.date == resolved.description
            || resolved.date == resolved.amount
            || resolved.description == resolved.amount
        {
            return Err(ReconciliationError::ColumnMapping(
                "each role needs its own column".to_string(),
            ));
        }
        Ok(resolved)
    }
}

/// Detected candidates per role, for the caller to confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDetection {
    /// All headers, in file order.
    pub headers: Vec<String>,
    /// Headers that look like dates.
    pub date_candidates: Vec<String>,
    /// Headers that look like descriptions.
    pub description_candidates: Vec<String>,
    /// Headers that look like amounts.
    pub amount_candidates: Vec<String>,
    /// Mapping to confirm; present only when every role has exactly one
    /// candidate.
    pub suggested: Option<ColumnMapping>,
}

impl ColumnDetection {
    /// True when a role has no candidate or several.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.suggested.is_none()
    }
}

/// Detects date, description, and amount columns from headers.
#[must_use]
pub fn detect_columns(headers: &[String]) -> ColumnDetection {
    let pick = |role: ColumnRole| -> Vec<String> {
        headers
            .iter()
            .filter(|h| role_of(h) == Some(role))
            .cloned()
            .collect()
    };

    let date_candidates = pick(ColumnRole::Date);
    let description_candidates = pick(ColumnRole::Description);
    let amount_candidates = pick(ColumnRole::Amount);

    let suggested = match (
        date_candidates.as_slice(),
        description_candidates.as_slice(),
        amount_candidates.as_slice(),
    ) {
        ([date], [description], [amount]) => Some(ColumnMapping {
            date: date.clone(),
            description: description.clone(),
            amount: amount.clone(),
        }),
        _ => None,
    };

    ColumnDetection {
        headers: headers.to_vec(),
        date_candidates,
        description_candidates,
        amount_candidates,
        suggested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[rstest]
    #[case("Transaction Date", Some(ColumnRole::Date))]
    #[case("VALUE DATE", Some(ColumnRole::Date))]
    #[case("Narrative", Some(ColumnRole::Description))]
    #[case("Memo", Some(ColumnRole::Description))]
    #[case("Details", Some(ColumnRole::Description))]
    #[case("Amt", Some(ColumnRole::Amount))]
    #[case("Debit", Some(ColumnRole::Amount))]
    #[case("Balance", None)]
    #[case("Reference", None)]
    fn test_role_of(#[case] header: &str, #[case] expected: Option<ColumnRole>) {
        assert_eq!(role_of(header), expected);
    }

    #[test]
    fn test_detect_unique_columns() {
        let detection = detect_columns(&headers(&["Date", "Description", "Amount", "Balance"]));
        assert!(!detection.is_ambiguous());
        let mapping = detection.suggested.unwrap();
        assert_eq!(mapping.date, "Date");
        assert_eq!(mapping.description, "Description");
        assert_eq!(mapping.amount, "Amount");
    }

    #[test]
    fn test_detect_ambiguous_amount() {
        let detection = detect_columns(&headers(&["Date", "Memo", "Debit", "Credit"]));
        assert!(detection.is_ambiguous());
        assert_eq!(detection.amount_candidates, vec!["Debit", "Credit"]);
    }

    #[test]
    fn test_detect_missing_description() {
        let detection = detect_columns(&headers(&["Posted Date", "Amount"]));
        assert!(detection.is_ambiguous());
        assert!(detection.description_candidates.is_empty());
    }

    #[test]
    fn test_resolve_mapping() {
        let h = headers(&["Date", "Payee", "Amount"]);
        let mapping = ColumnMapping {
            date: "date".into(),
            description: "Payee".into(),
            amount: " AMOUNT ".into(),
        };
        assert_eq!(
            mapping.resolve(&h).unwrap(),
            ResolvedColumns {
                date: 0,
                description: 1,
                amount: 2
            }
        );
    }

    #[test]
    fn test_resolve_errors() {
        let h = headers(&["Date", "Description", "Amount", "Amount"]);
        let missing = ColumnMapping {
            date: "Date".into(),
            description: "Narrative".into(),
            amount: "Description".into(),
        };
        assert!(matches!(
            missing.resolve(&h),
            Err(ReconciliationError::ColumnMapping(_))
        ));

        let duplicate = ColumnMapping {
            date: "Date".into(),
            description: "Description".into(),
            amount: "Amount".into(),
        };
        assert!(duplicate.resolve(&h).is_err());

        let shared = ColumnMapping {
            date: "Date".into(),
            description: "Date".into(),
            amount: "Description".into(),
        };
        assert!(shared.resolve(&headers(&["Date", "Description"])).is_err());
    }
}
