//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutating method opens one serializable transaction, writes exactly
//! one audit entry inside it and commits; a failure rolls back both.

pub mod account;
pub mod audit;
pub mod bank_rule;
pub mod bank_transaction;
pub mod error;
pub mod expense;
pub mod invoice;
pub mod journal;
pub mod organization;
pub mod posting;
pub mod reconciliation;
pub mod report;
pub mod tax;

pub use account::{AccountFilter, AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use audit::AuditRepository;
pub use bank_rule::{BankRuleRepository, CreateBankRuleInput, UpdateBankRuleInput};
pub use bank_transaction::{
    AutoMatchSummary, BankTransactionFilter, BankTransactionRepository, ImportSummary,
    RuleRunSummary, StatusChangeInput,
};
pub use error::RepositoryError;
pub use expense::{CreateExpenseInput, ExpenseFilter, ExpenseRepository, UpdateExpenseInput};
pub use invoice::{CreateInvoiceInput, InvoiceFilter, InvoiceRepository};
pub use journal::{JournalFilter, JournalRepository, ManualEntryInput, TransferInput};
pub use organization::OrganizationRepository;
pub use posting::{PostedJournal, PostingRepository};
pub use reconciliation::{
    CreateReconciliationInput, ReconciliationRepository, ReconciliationWorkspace,
};
pub use report::ReportRepository;
pub use tax::{CreateTaxRateInput, PrepareFilingInput, TaxRepository};
