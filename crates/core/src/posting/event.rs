//! Business events that produce journal entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BankTransactionId, ExpenseId, InvoiceId};

use crate::ledger::types::{EntrySource, JournalLineInput};

/// An event the posting engine knows how to journalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostingEvent {
    /// Invoice sent to a customer.
    InvoiceIssued {
        /// Invoice ID.
        invoice_id: InvoiceId,
        /// Invoice number.
        invoice_number: String,
        /// Customer name.
        customer: String,
        /// Issue date.
        date: NaiveDate,
        /// Income account; `Sales` when absent.
        income_account: Option<AccountId>,
        /// Amount before tax.
        subtotal: Decimal,
        /// Sales tax.
        tax: Decimal,
        /// Subtotal plus tax.
        total: Decimal,
    },
    /// Customer payment against an invoice.
    PaymentReceived {
        /// Invoice ID.
        invoice_id: InvoiceId,
        /// Invoice number.
        invoice_number: String,
        /// Payment date.
        date: NaiveDate,
        /// Amount received.
        amount: Decimal,
        /// Account receiving the money; Undeposited Funds when absent.
        deposit_account: Option<AccountId>,
    },
    /// Undeposited customer funds moved into a bank account.
    FundsDeposited {
        /// Invoice ID.
        invoice_id: InvoiceId,
        /// Invoice number.
        invoice_number: String,
        /// Deposit date.
        date: NaiveDate,
        /// Amount deposited.
        amount: Decimal,
        /// Receiving bank account.
        bank_account: AccountId,
    },
    /// Expense or cheque paid immediately.
    ExpenseRecorded {
        /// Expense ID.
        expense_id: ExpenseId,
        /// Payee name.
        payee: String,
        /// Expense date.
        date: NaiveDate,
        /// Expense account.
        expense_account: AccountId,
        /// Bank or credit card the expense was paid from.
        payment_account: AccountId,
        /// Amount before tax.
        subtotal: Decimal,
        /// Recoverable sales tax.
        tax: Decimal,
        /// Subtotal plus tax.
        total: Decimal,
    },
    /// Supplier bill recorded on account.
    BillRecorded {
        /// Expense ID of the bill.
        expense_id: ExpenseId,
        /// Supplier name.
        payee: String,
        /// Bill date.
        date: NaiveDate,
        /// Expense account.
        expense_account: AccountId,
        /// Amount before tax.
        subtotal: Decimal,
        /// Recoverable sales tax.
        tax: Decimal,
        /// Subtotal plus tax.
        total: Decimal,
    },
    /// Payment of a recorded bill.
    BillPaid {
        /// Expense ID of the bill.
        expense_id: ExpenseId,
        /// Supplier name.
        payee: String,
        /// Payment date.
        date: NaiveDate,
        /// Bank or credit card the bill was paid from.
        payment_account: AccountId,
        /// Amount paid.
        amount: Decimal,
    },
    /// Money moved between two balance sheet accounts.
    Transfer {
        /// Transfer date.
        date: NaiveDate,
        /// Source account.
        from_account: AccountId,
        /// Destination account.
        to_account: AccountId,
        /// Amount moved.
        amount: Decimal,
        /// Optional memo.
        memo: Option<String>,
    },
    /// Bank statement line assigned to a category account.
    BankTransactionCategorized {
        /// Bank transaction ID.
        transaction_id: BankTransactionId,
        /// Statement date.
        date: NaiveDate,
        /// Statement description.
        description: String,
        /// Bank or credit card account the line was imported into.
        bank_account: AccountId,
        /// Category account.
        category_account: AccountId,
        /// Signed amount; positive for deposits.
        amount: Decimal,
    },
    /// Caller-supplied lines.
    ManualAdjustment {
        /// Posting date.
        date: NaiveDate,
        /// Entry memo.
        memo: String,
        /// Lines to post.
        lines: Vec<JournalLineInput>,
    },
}

impl PostingEvent {
    /// Entry source recorded for this event.
    #[must_use]
    pub const fn source(&self) -> EntrySource {
        match self {
            Self::InvoiceIssued { .. } => EntrySource::Invoice,
            Self::PaymentReceived { .. } => EntrySource::Payment,
            Self::FundsDeposited { .. } => EntrySource::Deposit,
            Self::ExpenseRecorded { .. } => EntrySource::Expense,
            Self::BillRecorded { .. } => EntrySource::Bill,
            Self::BillPaid { .. } => EntrySource::BillPayment,
            Self::Transfer { .. } => EntrySource::Transfer,
            Self::BankTransactionCategorized { .. } => EntrySource::BankTransaction,
            Self::ManualAdjustment { .. } => EntrySource::ManualAdjustment,
        }
    }

    /// Posting date of the event.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::InvoiceIssued { date, .. }
            | Self::PaymentReceived { date, .. }
            | Self::FundsDeposited { date, .. }
            | Self::ExpenseRecorded { date, .. }
            | Self::BillRecorded { date, .. }
            | Self::BillPaid { date, .. }
            | Self::Transfer { date, .. }
            | Self::BankTransactionCategorized { date, .. }
            | Self::ManualAdjustment { date, .. } => *date,
        }
    }
}
