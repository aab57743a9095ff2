//! Report generation service.
//!
//! Every report is computed from posted journal lines; no balance is stored.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use crate::ledger::balance::{
    AccountInfo, AccountTotals, DateWindow, PostedLine, aggregate_totals,
    calculate_balance_change, type_rank,
};
use crate::ledger::types::{AccountCategory, AccountType};
use crate::tax::TaxSummary;

use super::error::ReportError;
use super::types::{
    AgedItem, AgingBucket, AgingReport, BalanceSheet, BalanceSheetPoint, GeneralLedger,
    GeneralLedgerAccount, GeneralLedgerLine, LedgerActivity, MonthlyBalanceSheet, MonthlyPnl,
    MonthlyPnlPoint, OpenItem, PartyBalance, ProfitAndLoss, ReportLine, ReportSection,
    TrialBalance, TrialBalanceLine,
};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Generates a Profit & Loss for an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn profit_and_loss(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProfitAndLoss, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        let totals = aggregate_totals(accounts, lines, DateWindow::between(start, end));
        Ok(Self::profit_and_loss_from_totals(start, end, &totals))
    }

    /// Builds a Profit & Loss from already aggregated totals.
    #[must_use]
    pub fn profit_and_loss_from_totals(
        start: NaiveDate,
        end: NaiveDate,
        totals: &[AccountTotals],
    ) -> ProfitAndLoss {
        let mut income = ReportSection::default();
        let mut cogs = ReportSection::default();
        let mut expenses = ReportSection::default();

        for total in totals {
            match total.account_type {
                AccountType::Income | AccountType::OtherIncome => income.push(line_of(total)),
                AccountType::CostOfGoodsSold => cogs.push(line_of(total)),
                AccountType::Expense | AccountType::OtherExpense => expenses.push(line_of(total)),
                _ => {}
            }
        }

        let total_expenses = cogs.total + expenses.total;
        ProfitAndLoss {
            start_date: start,
            end_date: end,
            total_income: income.total,
            total_cost_of_goods_sold: cogs.total,
            total_expenses,
            gross_profit: income.total - cogs.total,
            net_profit: income.total - total_expenses,
            income: income.lines,
            cost_of_goods_sold: cogs.lines,
            expenses: expenses.lines,
        }
    }

    /// Generates a Profit & Loss for each month of a calendar year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYear` if the year cannot be represented.
    pub fn monthly_profit_and_loss(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        year: i32,
    ) -> Result<MonthlyPnl, ReportError> {
        let mut months = Vec::with_capacity(12);
        for (month, label) in (1..=12).zip(MONTH_LABELS) {
            let (start, end) = month_bounds(year, month)?;
            let pnl = Self::profit_and_loss(accounts, lines, start, end)?;
            months.push(MonthlyPnlPoint {
                month,
                label: label.to_string(),
                total_income: pnl.total_income,
                total_expenses: pnl.total_expenses,
                net_profit: pnl.net_profit,
            });
        }
        Ok(MonthlyPnl { year, months })
    }

    /// Generates a balance sheet as of a date, inclusive.
    ///
    /// Income and expense activity up to the date rolls into retained
    /// earnings, so a ledger of balanced entries always balances.
    #[must_use]
    pub fn balance_sheet(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        as_of: NaiveDate,
    ) -> BalanceSheet {
        let totals = aggregate_totals(accounts, lines, DateWindow::up_to(as_of));

        let mut assets = ReportSection::default();
        let mut liabilities = ReportSection::default();
        let mut equity = ReportSection::default();
        let mut retained_earnings = Decimal::ZERO;

        for total in &totals {
            match total.account_type.category() {
                AccountCategory::Asset => assets.push(line_of(total)),
                AccountCategory::Liability => liabilities.push(line_of(total)),
                AccountCategory::Equity => equity.push(line_of(total)),
                AccountCategory::Income => retained_earnings += total.balance(),
                AccountCategory::Expense => retained_earnings -= total.balance(),
            }
        }

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total + retained_earnings;
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheet {
            as_of,
            assets,
            liabilities,
            equity,
            retained_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced: total_assets == liabilities_and_equity,
        }
    }

    /// Generates balance sheet totals at each month end of a calendar year.
    ///
    /// # Errors
    ///
    /// Returns `InvalidYear` if the year cannot be represented.
    pub fn monthly_balance_sheet(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        year: i32,
    ) -> Result<MonthlyBalanceSheet, ReportError> {
        let mut months = Vec::with_capacity(12);
        for (month, label) in (1..=12).zip(MONTH_LABELS) {
            let (_, end) = month_bounds(year, month)?;
            let sheet = Self::balance_sheet(accounts, lines, end);
            months.push(BalanceSheetPoint {
                month,
                label: label.to_string(),
                total_assets: sheet.total_assets,
                total_liabilities: sheet.total_liabilities,
                total_equity: sheet.total_equity,
            });
        }
        Ok(MonthlyBalanceSheet { year, months })
    }

    /// Generates a trial balance as of a date, inclusive.
    ///
    /// Each account shows its net balance in the debit or credit column.
    #[must_use]
    pub fn trial_balance(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        as_of: NaiveDate,
    ) -> TrialBalance {
        let totals = aggregate_totals(accounts, lines, DateWindow::up_to(as_of));

        let rows: Vec<TrialBalanceLine> = totals
            .iter()
            .filter_map(|t| {
                let net = t.total_debit - t.total_credit;
                if net.is_zero() {
                    return None;
                }
                Some(TrialBalanceLine {
                    account_id: t.account_id,
                    name: t.name.clone(),
                    account_type: t.account_type,
                    debit: net.max(Decimal::ZERO),
                    credit: (-net).max(Decimal::ZERO),
                })
            })
            .collect();

        let total_debit: Decimal = rows.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = rows.iter().map(|l| l.credit).sum();

        TrialBalance {
            as_of,
            lines: rows,
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    /// Summarizes sales tax collected and paid over an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn tax_summary(
        accounts: &[AccountInfo],
        lines: &[PostedLine],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaxSummary, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        let totals = aggregate_totals(accounts, lines, DateWindow::between(start, end));
        Ok(TaxSummary::from_totals(&totals))
    }

    /// Generates the general ledger for an inclusive date range.
    ///
    /// Every account opens at its balance before `start` and carries a
    /// running balance through its lines. Lines on the same day keep the
    /// order they were given in. With `only` set, that account is listed even
    /// without activity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn general_ledger(
        accounts: &[AccountInfo],
        activity: &[LedgerActivity],
        start: NaiveDate,
        end: NaiveDate,
        only: Option<AccountId>,
    ) -> Result<GeneralLedger, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }

        let mut by_account: HashMap<AccountId, Vec<&LedgerActivity>> = HashMap::new();
        for item in activity {
            by_account.entry(item.line.account_id).or_default().push(item);
        }

        let mut selected: Vec<&AccountInfo> = accounts
            .iter()
            .filter(|a| only.is_none_or(|id| a.id == id))
            .collect();
        selected.sort_by(|a, b| {
            type_rank(a.account_type)
                .cmp(&type_rank(b.account_type))
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut ledgers = Vec::new();
        for info in selected {
            let items = by_account.remove(&info.id).unwrap_or_default();
            let ledger = account_ledger(info, items, start, end);
            if only.is_some() || !ledger.lines.is_empty() || !ledger.opening_balance.is_zero() {
                ledgers.push(ledger);
            }
        }

        Ok(GeneralLedger {
            start_date: start,
            end_date: end,
            accounts: ledgers,
        })
    }

    /// Groups unpaid invoices or bills by how far past due they are.
    ///
    /// Items with nothing left to pay are left out.
    #[must_use]
    pub fn aging(items: &[OpenItem], as_of: NaiveDate) -> AgingReport {
        let mut report = AgingReport {
            as_of,
            current: Decimal::ZERO,
            thirty_days: Decimal::ZERO,
            sixty_days: Decimal::ZERO,
            ninety_days: Decimal::ZERO,
            over_ninety: Decimal::ZERO,
            total: Decimal::ZERO,
            items: Vec::new(),
        };

        for item in items.iter().filter(|i| i.amount_due > Decimal::ZERO) {
            let days_overdue = (as_of - item.due_date).num_days();
            let bucket = AgingBucket::for_days(days_overdue);
            let slot = match bucket {
                AgingBucket::Current => &mut report.current,
                AgingBucket::ThirtyDays => &mut report.thirty_days,
                AgingBucket::SixtyDays => &mut report.sixty_days,
                AgingBucket::NinetyDays => &mut report.ninety_days,
                AgingBucket::OverNinety => &mut report.over_ninety,
            };
            *slot += item.amount_due;
            report.total += item.amount_due;
            report.items.push(AgedItem {
                item: item.clone(),
                days_overdue,
                bucket,
            });
        }

        report.items.sort_by(|a, b| {
            a.item
                .due_date
                .cmp(&b.item.due_date)
                .then_with(|| a.item.party.cmp(&b.item.party))
        });
        report
    }

    /// Totals the amounts due per customer or supplier, ordered by name.
    ///
    /// Parties whose documents are all paid are listed with a zero balance.
    #[must_use]
    pub fn party_balances(items: &[OpenItem]) -> Vec<PartyBalance> {
        let mut parties: BTreeMap<&str, PartyBalance> = BTreeMap::new();
        for item in items {
            let entry = parties.entry(item.party.as_str()).or_insert_with(|| PartyBalance {
                name: item.party.clone(),
                balance: Decimal::ZERO,
                open_items: 0,
            });
            if item.amount_due > Decimal::ZERO {
                entry.balance += item.amount_due;
                entry.open_items += 1;
            }
        }
        parties.into_values().collect()
    }

    /// Returns the first and last day of the year containing `date`.
    #[must_use]
    pub fn year_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
        let end = NaiveDate::from_ymd_opt(date.year(), 12, 31)?;
        Some((start, end))
    }
}

fn line_of(total: &AccountTotals) -> ReportLine {
    ReportLine {
        account_id: total.account_id,
        name: total.name.clone(),
        account_type: total.account_type,
        amount: total.balance(),
    }
}

fn account_ledger(
    info: &AccountInfo,
    mut items: Vec<&LedgerActivity>,
    start: NaiveDate,
    end: NaiveDate,
) -> GeneralLedgerAccount {
    items.sort_by_key(|item| item.line.entry_date);

    let change =
        |line: &PostedLine| calculate_balance_change(info.account_type, line.debit, line.credit);
    let opening_balance: Decimal = items
        .iter()
        .filter(|item| item.line.entry_date < start)
        .map(|item| change(&item.line))
        .sum();

    let mut balance = opening_balance;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    let window = DateWindow::between(start, end);
    let lines = items
        .into_iter()
        .filter(|item| window.contains(item.line.entry_date))
        .map(|item| {
            balance += change(&item.line);
            total_debit += item.line.debit;
            total_credit += item.line.credit;
            GeneralLedgerLine {
                date: item.line.entry_date,
                entry_id: item.entry_id,
                entry_number: item.entry_number.clone(),
                memo: item.memo.clone(),
                debit: item.line.debit,
                credit: item.line.credit,
                balance,
            }
        })
        .collect();

    GeneralLedgerAccount {
        account_id: info.id,
        name: info.name.clone(),
        account_type: info.account_type,
        opening_balance,
        lines,
        total_debit,
        total_credit,
        closing_balance: balance,
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ReportError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ReportError::InvalidYear(year))?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or(ReportError::InvalidYear(year))?;
    Ok((start, end))
}
