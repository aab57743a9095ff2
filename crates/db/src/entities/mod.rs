//! `SeaORM` entity definitions.
//!
//! Money columns hold integer minor units (`*_minor`); status and type
//! columns hold the domain enums' string forms.

pub mod accounts;
pub mod audit_log;
pub mod bank_rules;
pub mod bank_transactions;
pub mod expenses;
pub mod invoices;
pub mod journal_entries;
pub mod journal_lines;
pub mod organizations;
pub mod reconciliations;
pub mod tax_filings;
pub mod tax_rates;

pub mod prelude {
    //! Entity re-exports.

    pub use super::accounts::Entity as Accounts;
    pub use super::audit_log::Entity as AuditLog;
    pub use super::bank_rules::Entity as BankRules;
    pub use super::bank_transactions::Entity as BankTransactions;
    pub use super::expenses::Entity as Expenses;
    pub use super::invoices::Entity as Invoices;
    pub use super::journal_entries::Entity as JournalEntries;
    pub use super::journal_lines::Entity as JournalLines;
    pub use super::organizations::Entity as Organizations;
    pub use super::reconciliations::Entity as Reconciliations;
    pub use super::tax_filings::Entity as TaxFilings;
    pub use super::tax_rates::Entity as TaxRates;
}
