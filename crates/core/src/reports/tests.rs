//! Tests for report generation.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, JournalEntryId};
use uuid::Uuid;

use super::error::ReportError;
use super::service::ReportService;
use super::types::{AgingBucket, LedgerActivity, OpenItem};
use crate::ledger::balance::{AccountInfo, PostedLine};
use crate::ledger::types::AccountType;
use crate::posting::types::SystemAccount;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn account(name: &str, account_type: AccountType) -> AccountInfo {
    AccountInfo {
        id: AccountId::new(),
        name: name.to_string(),
        account_type,
    }
}

fn post(
    lines: &mut Vec<PostedLine>,
    on: NaiveDate,
    debit: &AccountInfo,
    credit: &AccountInfo,
    amount: Decimal,
) {
    lines.push(PostedLine {
        account_id: debit.id,
        entry_date: on,
        debit: amount,
        credit: Decimal::ZERO,
    });
    lines.push(PostedLine {
        account_id: credit.id,
        entry_date: on,
        debit: Decimal::ZERO,
        credit: amount,
    });
}

struct Books {
    accounts: Vec<AccountInfo>,
    lines: Vec<PostedLine>,
}

/// A $452 invoice (400 + 52 HST) and a $113 expense (100 + 13 HST) in March.
fn march_books() -> Books {
    let bank = account("Chequing", AccountType::Bank);
    let ar = account(SystemAccount::AccountsReceivable.name(), AccountType::AccountsReceivable);
    let hst_payable = account(
        SystemAccount::SalesTaxPayable.name(),
        AccountType::OtherCurrentLiabilities,
    );
    let hst_receivable = account(
        SystemAccount::SalesTaxReceivable.name(),
        AccountType::OtherCurrentAssets,
    );
    let sales = account("Consulting Income", AccountType::Income);
    let rent = account("Rent", AccountType::Expense);
    let unused = account("Equipment", AccountType::FixedAssets);

    let on = date(2026, 3, 10);
    let mut lines = Vec::new();
    post(&mut lines, on, &ar, &sales, dec!(400.00));
    post(&mut lines, on, &ar, &hst_payable, dec!(52.00));
    post(&mut lines, date(2026, 3, 15), &rent, &bank, dec!(100.00));
    post(&mut lines, date(2026, 3, 15), &hst_receivable, &bank, dec!(13.00));

    Books {
        accounts: vec![bank, ar, hst_payable, hst_receivable, sales, rent, unused],
        lines,
    }
}

#[test]
fn test_profit_and_loss_for_period() {
    let books = march_books();
    let pnl = ReportService::profit_and_loss(
        &books.accounts,
        &books.lines,
        date(2026, 3, 1),
        date(2026, 3, 31),
    )
    .unwrap();

    assert_eq!(pnl.total_income, dec!(400.00));
    assert_eq!(pnl.total_expenses, dec!(100.00));
    assert_eq!(pnl.gross_profit, dec!(400.00));
    assert_eq!(pnl.net_profit, dec!(300.00));
    assert_eq!(pnl.income.len(), 1);
    assert_eq!(pnl.expenses[0].name, "Rent");
    assert!(pnl.cost_of_goods_sold.is_empty());
}

#[test]
fn test_profit_and_loss_without_income_is_zero() {
    let books = march_books();
    let pnl = ReportService::profit_and_loss(
        &books.accounts,
        &books.lines,
        date(2026, 1, 1),
        date(2026, 1, 31),
    )
    .unwrap();

    assert_eq!(pnl.total_income, Decimal::ZERO);
    assert_eq!(pnl.total_expenses, Decimal::ZERO);
    assert_eq!(pnl.net_profit, Decimal::ZERO);
    assert!(pnl.income.is_empty());
    assert!(pnl.expenses.is_empty());
}

#[test]
fn test_profit_and_loss_rejects_inverted_range() {
    let result = ReportService::profit_and_loss(&[], &[], date(2026, 3, 31), date(2026, 3, 1));
    assert!(matches!(result, Err(ReportError::InvalidDateRange { .. })));
}

#[test]
fn test_net_loss_displays_in_parentheses() {
    let bank = account("Chequing", AccountType::Bank);
    let rent = account("Rent", AccountType::Expense);
    let mut lines = Vec::new();
    post(&mut lines, date(2026, 2, 1), &rent, &bank, dec!(1250.00));

    let pnl =
        ReportService::profit_and_loss(&[bank, rent], &lines, date(2026, 2, 1), date(2026, 2, 28))
            .unwrap();

    assert_eq!(pnl.net_profit, dec!(-1250.00));
    assert_eq!(pnl.display_net_profit(), "(1,250.00)");
    assert_eq!(pnl.expenses[0].display_amount(), "1,250.00");
}

#[test]
fn test_cost_of_goods_sold_counts_toward_expenses() {
    let bank = account("Chequing", AccountType::Bank);
    let sales = account("Sales", AccountType::Income);
    let materials = account("Materials", AccountType::CostOfGoodsSold);
    let mut lines = Vec::new();
    post(&mut lines, date(2026, 5, 1), &bank, &sales, dec!(1000.00));
    post(&mut lines, date(2026, 5, 2), &materials, &bank, dec!(300.00));

    let pnl = ReportService::profit_and_loss(
        &[bank, sales, materials],
        &lines,
        date(2026, 5, 1),
        date(2026, 5, 31),
    )
    .unwrap();

    assert_eq!(pnl.total_cost_of_goods_sold, dec!(300.00));
    assert_eq!(pnl.gross_profit, dec!(700.00));
    assert_eq!(pnl.total_expenses, dec!(300.00));
    assert_eq!(pnl.net_profit, dec!(700.00));
}

#[test]
fn test_balance_sheet_rolls_profit_into_retained_earnings() {
    let books = march_books();
    let sheet = ReportService::balance_sheet(&books.accounts, &books.lines, date(2026, 3, 31));

    assert_eq!(sheet.total_assets, dec!(352.00));
    assert_eq!(sheet.total_liabilities, dec!(52.00));
    assert_eq!(sheet.retained_earnings, dec!(300.00));
    assert_eq!(sheet.total_equity, dec!(300.00));
    assert!(sheet.is_balanced);
    assert!(sheet.assets.lines.iter().all(|l| l.name != "Equipment"));
}

#[test]
fn test_balance_sheet_before_any_activity_is_empty() {
    let books = march_books();
    let sheet = ReportService::balance_sheet(&books.accounts, &books.lines, date(2026, 2, 28));

    assert!(sheet.assets.lines.is_empty());
    assert_eq!(sheet.total_assets, Decimal::ZERO);
    assert!(sheet.is_balanced);
}

#[test]
fn test_trial_balance_nets_each_account() {
    let books = march_books();
    let trial = ReportService::trial_balance(&books.accounts, &books.lines, date(2026, 3, 31));

    assert_eq!(trial.total_debit, dec!(565.00));
    assert_eq!(trial.total_credit, dec!(565.00));
    assert!(trial.is_balanced);

    let bank = trial.lines.iter().find(|l| l.name == "Chequing").unwrap();
    assert_eq!(bank.debit, Decimal::ZERO);
    assert_eq!(bank.credit, dec!(113.00));
}

#[test]
fn test_monthly_profit_and_loss() {
    let books = march_books();
    let monthly =
        ReportService::monthly_profit_and_loss(&books.accounts, &books.lines, 2026).unwrap();

    assert_eq!(monthly.months.len(), 12);
    assert_eq!(monthly.months[2].label, "Mar");
    assert_eq!(monthly.months[2].net_profit, dec!(300.00));
    assert_eq!(monthly.months[1].total_income, Decimal::ZERO);
    assert_eq!(monthly.months[11].month, 12);
}

#[test]
fn test_monthly_balance_sheet_carries_forward() {
    let books = march_books();
    let monthly =
        ReportService::monthly_balance_sheet(&books.accounts, &books.lines, 2026).unwrap();

    assert_eq!(monthly.months[1].total_assets, Decimal::ZERO);
    assert_eq!(monthly.months[2].total_assets, dec!(352.00));
    assert_eq!(monthly.months[11].total_assets, dec!(352.00));
    assert_eq!(monthly.months[11].total_equity, dec!(300.00));
}

#[test]
fn test_tax_summary_nets_collected_against_paid() {
    let books = march_books();
    let summary = ReportService::tax_summary(
        &books.accounts,
        &books.lines,
        date(2026, 1, 1),
        date(2026, 3, 31),
    )
    .unwrap();

    assert_eq!(summary.collected, dec!(52.00));
    assert_eq!(summary.paid, dec!(13.00));
    assert_eq!(summary.net, dec!(39.00));
}

#[test]
fn test_year_bounds() {
    let (start, end) = ReportService::year_bounds(date(2026, 7, 4)).unwrap();
    assert_eq!(start, date(2026, 1, 1));
    assert_eq!(end, date(2026, 12, 31));
}

fn activity(lines: &[PostedLine]) -> Vec<LedgerActivity> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| LedgerActivity {
            line: *line,
            entry_id: JournalEntryId::new(),
            entry_number: format!("JE-{:04}", i / 2 + 1),
            memo: format!("Entry {}", i / 2 + 1),
        })
        .collect()
}

#[test]
fn test_general_ledger_carries_running_balance_from_opening() {
    let bank = account("Chequing", AccountType::Bank);
    let sales = account("Sales", AccountType::Income);
    let rent = account("Rent", AccountType::Expense);
    let mut lines = Vec::new();
    post(&mut lines, date(2026, 2, 20), &bank, &sales, dec!(1000.00));
    post(&mut lines, date(2026, 3, 1), &rent, &bank, dec!(250.00));
    post(&mut lines, date(2026, 3, 9), &bank, &sales, dec!(452.00));
    post(&mut lines, date(2026, 4, 2), &rent, &bank, dec!(250.00));
    let accounts = vec![sales.clone(), rent, bank.clone()];

    let ledger = ReportService::general_ledger(
        &accounts,
        &activity(&lines),
        date(2026, 3, 1),
        date(2026, 3, 31),
        None,
    )
    .unwrap();

    assert_eq!(ledger.accounts.len(), 3);
    let chequing = &ledger.accounts[0];
    assert_eq!(chequing.account_id, bank.id);
    assert_eq!(chequing.opening_balance, dec!(1000.00));
    assert_eq!(chequing.lines.len(), 2);
    assert_eq!(chequing.lines[0].entry_number, "JE-0002");
    assert_eq!(chequing.lines[0].balance, dec!(750.00));
    assert_eq!(chequing.lines[1].balance, dec!(1202.00));
    assert_eq!(chequing.total_debit, dec!(452.00));
    assert_eq!(chequing.total_credit, dec!(250.00));
    assert_eq!(chequing.closing_balance, dec!(1202.00));

    let income = ledger.accounts.iter().find(|a| a.account_id == sales.id).unwrap();
    assert_eq!(income.opening_balance, dec!(1000.00));
    assert_eq!(income.closing_balance, dec!(1452.00));
}

#[test]
fn test_general_ledger_for_one_account_lists_it_without_activity() {
    let books = march_books();
    let unused = books.accounts.iter().find(|a| a.name == "Equipment").unwrap().id;

    let ledger = ReportService::general_ledger(
        &books.accounts,
        &activity(&books.lines),
        date(2026, 3, 1),
        date(2026, 3, 31),
        Some(unused),
    )
    .unwrap();

    assert_eq!(ledger.accounts.len(), 1);
    assert!(ledger.accounts[0].lines.is_empty());
    assert_eq!(ledger.accounts[0].closing_balance, Decimal::ZERO);
}

#[test]
fn test_general_ledger_rejects_inverted_range() {
    let result =
        ReportService::general_ledger(&[], &[], date(2026, 3, 31), date(2026, 3, 1), None);
    assert!(matches!(result, Err(ReportError::InvalidDateRange { .. })));
}

fn open_item(party: &str, due: NaiveDate, amount_due: Decimal) -> OpenItem {
    OpenItem {
        id: Uuid::new_v4(),
        party: party.to_string(),
        reference: format!("INV-{}", due.format("%m%d")),
        due_date: due,
        amount_due,
    }
}

#[test]
fn test_aging_buckets_by_days_past_due() {
    let as_of = date(2026, 6, 30);
    let items = vec![
        open_item("SWCHC", date(2026, 7, 15), dec!(610.20)),
        open_item("Yasminder Dhillon", date(2026, 6, 30), dec!(452.00)),
        open_item("Michel Sturgeon", date(2026, 6, 29), dec!(1017.00)),
        open_item("SWCHC", date(2026, 5, 1), dec!(100.00)),
        open_item("Michel Sturgeon", date(2026, 4, 1), dec!(50.00)),
        open_item("Michel Sturgeon", date(2026, 1, 2), dec!(25.00)),
        open_item("Paid Up", date(2026, 1, 2), Decimal::ZERO),
    ];

    let report = ReportService::aging(&items, as_of);

    assert_eq!(report.current, dec!(1062.20));
    assert_eq!(report.thirty_days, dec!(1017.00));
    assert_eq!(report.sixty_days, dec!(100.00));
    assert_eq!(report.ninety_days, dec!(50.00));
    assert_eq!(report.over_ninety, dec!(25.00));
    assert_eq!(report.total, dec!(2254.20));
    assert_eq!(report.items.len(), 6);
    assert_eq!(report.items[0].bucket, AgingBucket::OverNinety);
    assert_eq!(report.items[0].days_overdue, 179);
    assert_eq!(report.items[5].bucket, AgingBucket::Current);
    assert_eq!(report.items[5].days_overdue, -15);
}

#[test]
fn test_aging_bucket_boundaries() {
    assert_eq!(AgingBucket::for_days(-3), AgingBucket::Current);
    assert_eq!(AgingBucket::for_days(0), AgingBucket::Current);
    assert_eq!(AgingBucket::for_days(1), AgingBucket::ThirtyDays);
    assert_eq!(AgingBucket::for_days(30), AgingBucket::ThirtyDays);
    assert_eq!(AgingBucket::for_days(31), AgingBucket::SixtyDays);
    assert_eq!(AgingBucket::for_days(90), AgingBucket::NinetyDays);
    assert_eq!(AgingBucket::for_days(91), AgingBucket::OverNinety);
}

#[test]
fn test_party_balances_list_paid_up_parties_at_zero() {
    let items = vec![
        open_item("Yasminder Dhillon", date(2026, 2, 19), dec!(452.00)),
        open_item("Michel Sturgeon", date(2026, 3, 1), Decimal::ZERO),
        open_item("Yasminder Dhillon", date(2026, 3, 19), dec!(113.00)),
    ];

    let balances = ReportService::party_balances(&items);

    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].name, "Michel Sturgeon");
    assert_eq!(balances[0].balance, Decimal::ZERO);
    assert_eq!(balances[0].open_items, 0);
    assert_eq!(balances[1].name, "Yasminder Dhillon");
    assert_eq!(balances[1].balance, dec!(565.00));
    assert_eq!(balances[1].open_items, 2);
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    (0usize..AccountType::ALL.len()).prop_map(|i| AccountType::ALL[i])
}

fn random_books(
    types: &[AccountType],
    postings: &[(usize, usize, i64, i64)],
) -> (Vec<AccountInfo>, Vec<PostedLine>) {
    let base = date(2026, 1, 1);
    let accounts: Vec<AccountInfo> = types
        .iter()
        .enumerate()
        .map(|(i, t)| account(&format!("Account {i}"), *t))
        .collect();
    let mut lines = Vec::new();
    for (dr, cr, cents, day) in postings {
        post(
            &mut lines,
            base + Duration::days(*day),
            &accounts[dr % accounts.len()],
            &accounts[cr % accounts.len()],
            Decimal::new(*cents, 2),
        );
    }
    (accounts, lines)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced postings always produce a balanced balance sheet at any date.
    #[test]
    fn prop_balance_sheet_balances(
        types in prop::collection::vec(account_type_strategy(), 2..8),
        postings in prop::collection::vec(
            (0usize..8, 0usize..8, 1i64..10_000_000, 0i64..365),
            1..30,
        ),
        as_of in 0i64..365,
    ) {
        let (accounts, lines) = random_books(&types, &postings);
        let sheet = ReportService::balance_sheet(
            &accounts,
            &lines,
            date(2026, 1, 1) + Duration::days(as_of),
        );

        prop_assert!(sheet.is_balanced);
        prop_assert_eq!(sheet.total_assets, sheet.total_liabilities + sheet.total_equity);
    }

    /// The trial balance debit and credit columns always agree.
    #[test]
    fn prop_trial_balance_balances(
        types in prop::collection::vec(account_type_strategy(), 2..8),
        postings in prop::collection::vec(
            (0usize..8, 0usize..8, 1i64..10_000_000, 0i64..365),
            1..30,
        ),
    ) {
        let (accounts, lines) = random_books(&types, &postings);
        let trial = ReportService::trial_balance(&accounts, &lines, date(2026, 12, 31));

        prop_assert!(trial.is_balanced);
        for line in &trial.lines {
            prop_assert!(line.debit.is_zero() || line.credit.is_zero());
        }
    }

    /// Net profit equals income less expenses, and the year's net profit
    /// equals the sum of its months.
    #[test]
    fn prop_monthly_profit_sums_to_year(
        types in prop::collection::vec(account_type_strategy(), 2..8),
        postings in prop::collection::vec(
            (0usize..8, 0usize..8, 1i64..10_000_000, 0i64..365),
            1..30,
        ),
    ) {
        let (accounts, lines) = random_books(&types, &postings);
        let year = ReportService::profit_and_loss(
            &accounts,
            &lines,
            date(2026, 1, 1),
            date(2026, 12, 31),
        )
        .unwrap();
        let monthly = ReportService::monthly_profit_and_loss(&accounts, &lines, 2026).unwrap();

        prop_assert_eq!(year.net_profit, year.total_income - year.total_expenses);
        let summed: Decimal = monthly.months.iter().map(|m| m.net_profit).sum();
        prop_assert_eq!(summed, year.net_profit);
    }
}
