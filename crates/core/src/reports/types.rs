//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::money::format_amount;
use tally_shared::types::{AccountId, JournalEntryId};
use uuid::Uuid;

use crate::ledger::balance::PostedLine;
use crate::ledger::types::AccountType;

/// One account on a report, signed by its normal side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Amount for the period or balance at the date.
    pub amount: Decimal,
}

impl ReportLine {
    /// Amount formatted for display, negatives in parentheses.
    #[must_use]
    pub fn display_amount(&self) -> String {
        format_amount(self.amount)
    }
}

/// Lines of one report section with their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    /// Accounts with a non-zero amount.
    pub lines: Vec<ReportLine>,
    /// Sum of the lines.
    pub total: Decimal,
}

impl ReportSection {
    /// Adds a line unless its amount is zero.
    pub fn push(&mut self, line: ReportLine) {
        if line.amount.is_zero() {
            return;
        }
        self.total += line.amount;
        self.lines.push(line);
    }
}

/// Profit & Loss for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Income and Other Income accounts.
    pub income: Vec<ReportLine>,
    /// Cost of Goods Sold accounts.
    pub cost_of_goods_sold: Vec<ReportLine>,
    /// Expense and Other Expense accounts.
    pub expenses: Vec<ReportLine>,
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of cost of goods sold.
    pub total_cost_of_goods_sold: Decimal,
    /// Sum of expenses including cost of goods sold.
    pub total_expenses: Decimal,
    /// Income less cost of goods sold.
    pub gross_profit: Decimal,
    /// Income less all expenses.
    pub net_profit: Decimal,
}

impl ProfitAndLoss {
    /// Net profit formatted for display, a loss in parentheses.
    #[must_use]
    pub fn display_net_profit(&self) -> String {
        format_amount(self.net_profit)
    }
}

/// Income, expenses, and profit for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPnlPoint {
    /// Month number, 1-12.
    pub month: u32,
    /// Short month name.
    pub label: String,
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of expenses including cost of goods sold.
    pub total_expenses: Decimal,
    /// Income less expenses.
    pub net_profit: Decimal,
}

/// Profit & Loss per calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPnl {
    /// Calendar year.
    pub year: i32,
    /// Twelve months, January first.
    pub months: Vec<MonthlyPnlPoint>,
}

/// Balance sheet as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    /// Balance date, inclusive.
    pub as_of: NaiveDate,
    /// Asset accounts.
    pub assets: ReportSection,
    /// Liability accounts.
    pub liabilities: ReportSection,
    /// Equity accounts.
    pub equity: ReportSection,
    /// Net profit of every period up to the balance date.
    pub retained_earnings: Decimal,
    /// Sum of assets.
    pub total_assets: Decimal,
    /// Sum of liabilities.
    pub total_liabilities: Decimal,
    /// Sum of equity accounts plus retained earnings.
    pub total_equity: Decimal,
    /// Liabilities plus total equity.
    pub liabilities_and_equity: Decimal,
    /// Assets equal liabilities plus equity.
    pub is_balanced: bool,
}

/// Balance sheet totals at one month end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetPoint {
    /// Month number, 1-12.
    pub month: u32,
    /// Short month name.
    pub label: String,
    /// Sum of assets.
    pub total_assets: Decimal,
    /// Sum of liabilities.
    pub total_liabilities: Decimal,
    /// Equity including retained earnings.
    pub total_equity: Decimal,
}

/// Balance sheet totals per month end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBalanceSheet {
    /// Calendar year.
    pub year: i32,
    /// Twelve month ends, January first.
    pub months: Vec<BalanceSheetPoint>,
}

/// One account on the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Net debit balance, or zero.
    pub debit: Decimal,
    /// Net credit balance, or zero.
    pub credit: Decimal,
}

/// Trial balance as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    /// Balance date, inclusive.
    pub as_of: NaiveDate,
    /// Accounts with a non-zero balance.
    pub lines: Vec<TrialBalanceLine>,
    /// Sum of the debit column.
    pub total_debit: Decimal,
    /// Sum of the credit column.
    pub total_credit: Decimal,
    /// Debit and credit columns agree.
    pub is_balanced: bool,
}

// ============================================================================
// General Ledger
// ============================================================================

/// A posted line together with the entry it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerActivity {
    /// The line as aggregated by the other reports.
    pub line: PostedLine,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Owning entry number, e.g. `JE-0007`.
    pub entry_number: String,
    /// Entry memo.
    pub memo: String,
}

/// One line of an account's ledger with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralLedgerLine {
    /// Posting date.
    pub date: NaiveDate,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Owning entry number.
    pub entry_number: String,
    /// Entry memo.
    pub memo: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Running balance, signed by the account's normal side.
    pub balance: Decimal,
}

/// Ledger of one account over the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralLedgerAccount {
    /// Account ID.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Balance before the first day of the period.
    pub opening_balance: Decimal,
    /// Lines in the period, oldest first.
    pub lines: Vec<GeneralLedgerLine>,
    /// Sum of debits in the period.
    pub total_debit: Decimal,
    /// Sum of credits in the period.
    pub total_credit: Decimal,
    /// Balance after the last line.
    pub closing_balance: Decimal,
}

/// General ledger for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralLedger {
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Accounts with activity or an opening balance.
    pub accounts: Vec<GeneralLedgerAccount>,
}

// ============================================================================
// Aging & Balances
// ============================================================================

/// An unpaid invoice or bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenItem {
    /// Invoice or expense ID.
    pub id: Uuid,
    /// Customer or supplier.
    pub party: String,
    /// Invoice number or bill reference.
    pub reference: String,
    /// Date the amount falls due.
    pub due_date: NaiveDate,
    /// Amount still owed.
    pub amount_due: Decimal,
}

/// How far past due an open item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    /// Not yet due.
    Current,
    /// 1 to 30 days past due.
    ThirtyDays,
    /// 31 to 60 days past due.
    SixtyDays,
    /// 61 to 90 days past due.
    NinetyDays,
    /// More than 90 days past due.
    OverNinety,
}

impl AgingBucket {
    /// Bucket for a number of days past due.
    #[must_use]
    pub const fn for_days(days_overdue: i64) -> Self {
        match days_overdue {
            i64::MIN..=0 => Self::Current,
            1..=30 => Self::ThirtyDays,
            31..=60 => Self::SixtyDays,
            61..=90 => Self::NinetyDays,
            _ => Self::OverNinety,
        }
    }
}

/// An open item placed in its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgedItem {
    /// The open item.
    #[serde(flatten)]
    pub item: OpenItem,
    /// Days past the due date; zero or negative when not yet due.
    pub days_overdue: i64,
    /// Bucket the item falls in.
    pub bucket: AgingBucket,
}

/// Receivables or payables grouped by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    /// Date the ages are measured from.
    pub as_of: NaiveDate,
    /// Not yet due.
    pub current: Decimal,
    /// 1 to 30 days past due.
    pub thirty_days: Decimal,
    /// 31 to 60 days past due.
    pub sixty_days: Decimal,
    /// 61 to 90 days past due.
    pub ninety_days: Decimal,
    /// More than 90 days past due.
    pub over_ninety: Decimal,
    /// Sum of every bucket.
    pub total: Decimal,
    /// Items, oldest due date first.
    pub items: Vec<AgedItem>,
}

/// Amount a customer owes or a supplier is owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBalance {
    /// Customer or supplier name.
    pub name: String,
    /// Sum of amounts due.
    pub balance: Decimal,
    /// Number of unpaid documents.
    pub open_items: usize,
}
