//! Statement parsing and row normalization.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::money::{parse_amount, to_minor_units};

use super::columns::ColumnMapping;
use super::error::ReconciliationError;

/// Description given to rows that arrive without one.
pub const DEFAULT_DESCRIPTION: &str = "Imported transaction";

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y", "%b %d, %Y"];

/// A statement row as received, before parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatementRow {
    /// Date text.
    pub date: String,
    /// Description text.
    #[serde(default)]
    pub description: String,
    /// Amount text; `(12.34)` is negative.
    pub amount: String,
}

/// A parsed statement row ready to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    /// Transaction date.
    pub date: NaiveDate,
    /// Trimmed description.
    pub description: String,
    /// Signed amount; positive for deposits.
    pub amount: Decimal,
}

/// A row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// One-based row number within the submitted rows.
    pub row: usize,
    /// Why the row was dropped.
    pub reason: String,
}

/// Outcome of parsing a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    /// Rows that parsed.
    pub rows: Vec<StatementRow>,
    /// Rows that did not.
    pub dropped: Vec<DroppedRow>,
}

/// Parses a statement date in any of the accepted formats.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn normalize_row(raw: &RawStatementRow) -> Result<StatementRow, String> {
    let date = parse_date(&raw.date).ok_or_else(|| format!("unparsable date '{}'", raw.date))?;
    let amount = parse_amount(&raw.amount).map_err(|e| e.to_string())?;
    to_minor_units(amount).map_err(|e| e.to_string())?;
    let description = match raw.description.trim() {
        "" => DEFAULT_DESCRIPTION.to_string(),
        text => text.to_string(),
    };
    Ok(StatementRow {
        date,
        description,
        amount,
    })
}

/// Normalizes raw rows, dropping the ones whose date or amount do not parse.
#[must_use]
pub fn normalize_rows(raws: &[RawStatementRow]) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();
    for (index, raw) in raws.iter().enumerate() {
        match normalize_row(raw) {
            Ok(row) => parsed.rows.push(row),
            Err(reason) => parsed.dropped.push(DroppedRow {
                row: index + 1,
                reason,
            }),
        }
    }
    parsed
}

fn reader(csv_text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes())
}

/// Reads the header row of a CSV statement.
///
/// # Errors
///
/// Returns `Csv` if the header cannot be read and `ColumnMapping` if the
/// file has no header.
pub fn read_headers(csv_text: &str) -> Result<Vec<String>, ReconciliationError> {
    let mut reader = reader(csv_text);
    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ReconciliationError::ColumnMapping(
            "statement has no header row".to_string(),
        ));
    }
    Ok(headers)
}

/// Parses a CSV statement with a confirmed column mapping.
///
/// Short rows and rows with unparsable dates or amounts are dropped; the
/// rest are returned in file order.
///
/// # Errors
///
/// Returns `ColumnMapping` if the mapping does not fit the headers and
/// `Csv` if the file is not valid CSV.
pub fn parse_csv(
    csv_text: &str,
    mapping: &ColumnMapping,
) -> Result<ParsedStatement, ReconciliationError> {
    let headers = read_headers(csv_text)?;
    let columns = mapping.resolve(&headers)?;

    let mut raws = Vec::new();
    let mut short = Vec::new();
    for (index, record) in reader(csv_text).records().enumerate() {
        let record = record?;
        let field = |i: usize| record.get(i).map(ToString::to_string);
        match (field(columns.date), field(columns.amount)) {
            (Some(date), Some(amount)) => raws.push((
                index + 1,
                RawStatementRow {
                    date,
                    description: field(columns.description).unwrap_or_default(),
                    amount,
                },
            )),
            _ => short.push(DroppedRow {
                row: index + 1,
                reason: "row has too few columns".to_string(),
            }),
        }
    }

    let mut parsed = ParsedStatement::default();
    for (row, raw) in raws {
        match normalize_row(&raw) {
            Ok(parsed_row) => parsed.rows.push(parsed_row),
            Err(reason) => parsed.dropped.push(DroppedRow { row, reason }),
        }
    }
    parsed.dropped.extend(short);
    parsed.dropped.sort_by_key(|d| d.row);
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2026-03-05", ymd(2026, 3, 5))]
    #[case("03/05/2026", ymd(2026, 3, 5))]
    #[case("2026/03/05", ymd(2026, 3, 5))]
    #[case("05-Mar-2026", ymd(2026, 3, 5))]
    #[case("Mar 05, 2026", ymd(2026, 3, 5))]
    #[case(" 2026-12-31 ", ymd(2026, 12, 31))]
    fn test_parse_date_formats(#[case] raw: &str, #[case] expected: NaiveDate) {
        assert_eq!(parse_date(raw), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2026-13-01")]
    #[case("31/12/2026")]
    fn test_parse_date_rejects(#[case] raw: &str) {
        assert_eq!(parse_date(raw), None);
    }

    #[test]
    fn test_normalize_rows_drops_bad_rows_only() {
        let raws = vec![
            RawStatementRow {
                date: "2026-03-01".into(),
                description: "  COFFEE  ".into(),
                amount: "(4.50)".into(),
            },
            RawStatementRow {
                date: "not a date".into(),
                description: "X".into(),
                amount: "1".into(),
            },
            RawStatementRow {
                date: "2026-03-02".into(),
                description: "".into(),
                amount: "$1,250.00".into(),
            },
            RawStatementRow {
                date: "2026-03-03".into(),
                description: "BAD AMOUNT".into(),
                amount: "abc".into(),
            },
        ];

        let parsed = normalize_rows(&raws);

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].description, "COFFEE");
        assert_eq!(parsed.rows[0].amount, dec!(-4.50));
        assert_eq!(parsed.rows[1].description, DEFAULT_DESCRIPTION);
        assert_eq!(parsed.rows[1].amount, dec!(1250.00));
        assert_eq!(
            parsed.dropped.iter().map(|d| d.row).collect::<Vec<_>>(),
            vec![2, 4]
        );
    }

    #[test]
    fn test_normalize_rows_drops_amounts_too_large_to_store() {
        let raw = |amount: &str| RawStatementRow {
            date: "2026-03-01".into(),
            description: "WIRE".into(),
            amount: amount.into(),
        };
        let raws = vec![
            raw("79228162514264337593543950335"),
            raw("100,000,000,000,000,000,000.00"),
            raw("12.00"),
        ];

        let parsed = normalize_rows(&raws);

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].amount, dec!(12.00));
        assert_eq!(
            parsed.dropped.iter().map(|d| d.row).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(parsed.dropped[0].reason.contains("out of range"));
    }

    #[test]
    fn test_read_headers() {
        let headers = read_headers("Date, Description ,Amount\n2026-01-01,x,1\n").unwrap();
        assert_eq!(headers, vec!["Date", "Description", "Amount"]);
    }

    #[test]
    fn test_parse_csv_with_mapping() {
        let csv = "\
Posted,Details,Value,Balance
2026-03-01,\"Payroll, March\",\"2,500.00\",3000
2026-03-02,Rent,(1200.00),1800
bad,Nothing,1,1
2026-03-04
";
        let mapping = ColumnMapping {
            date: "Posted".into(),
            description: "Details".into(),
            amount: "Value".into(),
        };

        let parsed = parse_csv(csv, &mapping).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].description, "Payroll, March");
        assert_eq!(parsed.rows[0].amount, dec!(2500.00));
        assert_eq!(parsed.rows[1].amount, dec!(-1200.00));
        assert_eq!(parsed.dropped.len(), 2);
        assert_eq!(parsed.dropped[0].row, 3);
        assert_eq!(parsed.dropped[1].row, 4);
    }

    #[test]
    fn test_parse_csv_bad_mapping() {
        let mapping = ColumnMapping {
            date: "Date".into(),
            description: "Memo".into(),
            amount: "Amount".into(),
        };
        assert!(matches!(
            parse_csv("Date,Amount\n2026-01-01,1\n", &mapping),
            Err(ReconciliationError::ColumnMapping(_))
        ));
    }
}
