//! Sequential document numbers.
//!
//! Journal entries are numbered `JE-0001`, `JE-0002`, ... and invoices
//! `INV-0001`, `INV-0002`, ... per organization.

/// Prefix for journal entry numbers.
pub const ENTRY_PREFIX: &str = "JE-";

/// Prefix for invoice numbers.
pub const INVOICE_PREFIX: &str = "INV-";

/// Formats a journal entry number from its one-based sequence.
#[must_use]
pub fn format_entry_number(sequence: u64) -> String {
    format!("{ENTRY_PREFIX}{sequence:04}")
}

/// Formats an invoice number from its sequence.
#[must_use]
pub fn format_invoice_number(sequence: u64) -> String {
    format!("{INVOICE_PREFIX}{sequence:04}")
}

/// Returns the next sequence after the highest numeric suffix found.
///
/// Numbers that do not carry `prefix` or have a non-numeric suffix are
/// ignored. Returns `first` when nothing usable exists.
#[must_use]
pub fn next_sequence<'a, I>(existing: I, prefix: &str, first: u64) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|number| number.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .map_or(first, |max| max.saturating_add(1).max(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_numbers_are_zero_padded() {
        assert_eq!(format_entry_number(1), "JE-0001");
        assert_eq!(format_entry_number(42), "JE-0042");
        assert_eq!(format_entry_number(12345), "JE-12345");
    }

    #[test]
    fn test_next_invoice_sequence() {
        assert_eq!(next_sequence(Vec::<&str>::new(), INVOICE_PREFIX, 1), 1);
        assert_eq!(
            next_sequence(["INV-0001", "INV-0007", "INV-0003"], INVOICE_PREFIX, 1),
            8
        );
        assert_eq!(format_invoice_number(8), "INV-0008");
    }

    #[test]
    fn test_next_sequence_ignores_foreign_numbers() {
        assert_eq!(
            next_sequence(["CUSTOM-9", "INV-abc", "INV-0002"], INVOICE_PREFIX, 1),
            3
        );
        assert_eq!(next_sequence(["JE-0004"], ENTRY_PREFIX, 1), 5);
    }
}
