//! Audit log export to CSV and JSON.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AuditError;
use super::types::AuditRecord;

/// Column headers of an audit export.
pub const EXPORT_COLUMNS: [&str; 6] =
    ["date", "action", "entityType", "entityId", "actor", "details"];

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array of objects.
    Json,
}

impl ExportFormat {
    /// MIME type of the exported body.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(AuditError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    date: String,
    action: String,
    entity_type: &'static str,
    entity_id: String,
    actor: &'a str,
    details: String,
}

impl<'a> From<&'a AuditRecord> for ExportRow<'a> {
    fn from(record: &'a AuditRecord) -> Self {
        Self {
            date: record.occurred_at.to_rfc3339(),
            action: record.action.to_string(),
            entity_type: record.entity_type.as_str(),
            entity_id: record.entity_id.to_string(),
            actor: &record.actor,
            details: record.detail.to_string(),
        }
    }
}

/// Renders records in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_records(records: &[AuditRecord], format: ExportFormat) -> Result<String, AuditError> {
    let rows: Vec<ExportRow<'_>> = records.iter().map(ExportRow::from).collect();
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            if rows.is_empty() {
                writer.write_record(EXPORT_COLUMNS)?;
            }
            for row in &rows {
                writer.serialize(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| AuditError::Export(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| AuditError::Export(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::{AuditAction, EntityType};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn record() -> AuditRecord {
        AuditRecord {
            id: Uuid::nil(),
            occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            actor: "jane@example.com".into(),
            action: AuditAction::Import,
            entity_type: EntityType::Account,
            entity_id: Uuid::nil(),
            detail: json!({"imported": 12, "skipped": 2}),
        }
    }

    #[test]
    fn test_csv_export_has_header_and_quoted_details() {
        let csv = export_records(&[record()], ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,action,entityType,entityId,actor,details"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2026-03-01T12:00:00+00:00,import,account,"));
        assert!(row.ends_with(r#""{""imported"":12,""skipped"":2}""#));
    }

    #[test]
    fn test_empty_csv_export_still_has_header() {
        let csv = export_records(&[], ExportFormat::Csv).unwrap();
        assert_eq!(csv.trim_end(), "date,action,entityType,entityId,actor,details");
    }

    #[test]
    fn test_json_export() {
        let body = export_records(&[record()], ExportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed[0]["entityType"], "account");
        assert_eq!(parsed[0]["action"], "import");
        assert_eq!(parsed[0]["actor"], "jane@example.com");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
