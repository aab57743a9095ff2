//! Database seeder for Tally development.
//!
//! Creates a demo organization with a small-business chart of accounts,
//! one categorization rule, a sent invoice, and a bank statement, then runs
//! the rules and the matcher over the statement.
//!
//! Usage: cargo run --bin seeder (after `migrator up`)

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::invoice::InvoiceStatus;
use tally_core::ledger::AccountType;
use tally_core::reconciliation::{RawStatementRow, RuleCondition, RuleField, RuleOperator};
use tally_db::entities::accounts;
use tally_db::repositories::{
    AccountFilter, CreateAccountInput, CreateBankRuleInput, CreateInvoiceInput,
};
use tally_db::{
    AccountRepository, BankRuleRepository, BankTransactionRepository, InvoiceRepository,
    OrganizationRepository, RepositoryError, connect_with,
};
use tally_shared::AppConfig;
use tally_shared::types::{AccountId, OrganizationId};
use tracing::info;

const ACTOR: &str = "seeder";
const BANK_ACCOUNT: &str = "Chequing";

/// Chart of accounts for a small service business: (name, type, detail type).
/// The posting engine adds its own system accounts on first use.
const CHART: &[(&str, AccountType, &str)] = &[
    (BANK_ACCOUNT, AccountType::Bank, "Cash on hand"),
    ("Visa", AccountType::CreditCard, "Credit card"),
    ("Prepaid expenses", AccountType::OtherCurrentAssets, "Prepaid Expenses"),
    ("Uncategorized Asset", AccountType::OtherCurrentAssets, "Other current assets"),
    ("Computer equipment", AccountType::FixedAssets, "Machinery and equipment"),
    ("Opening Balance Equity", AccountType::Equity, "Opening Balance Equity"),
    ("Owner's Draw", AccountType::Equity, "Owner's Equity"),
    ("Discounts given", AccountType::Income, "Discounts/Refunds Given"),
    ("Shipping and Delivery Income", AccountType::Income, "Other Primary Income"),
    ("Uncategorized Income", AccountType::Income, "Sales of Product Income"),
    ("Subcontractors - COS", AccountType::CostOfGoodsSold, "Cost of Labour - COS"),
    ("Supplies and materials - COS", AccountType::CostOfGoodsSold, "Supplies and materials - COS"),
    ("Advertising", AccountType::Expense, "Advertising/Promotional"),
    ("Bank charges", AccountType::Expense, "Bank charges"),
    ("Dues and Subscriptions", AccountType::Expense, "Office/General Administrative Expenses"),
    ("Insurance", AccountType::Expense, "Insurance"),
    ("Legal and professional fees", AccountType::Expense, "Legal and professional fees"),
    ("Meals and entertainment", AccountType::Expense, "Meals and entertainment"),
    ("Office expenses", AccountType::Expense, "Office/General Administrative Expenses"),
    ("Payment Processing Fees", AccountType::Expense, "Other selling expenses"),
    ("Rent or lease payments", AccountType::Expense, "Rent or Lease of Buildings"),
    ("Supplies", AccountType::Expense, "Supplies"),
    ("Travel", AccountType::Expense, "Travel"),
    ("Uncategorized Expense", AccountType::Expense, "Other Miscellaneous Service Cost"),
    ("Utilities", AccountType::Expense, "Utilities"),
    ("Interest earned", AccountType::OtherIncome, "Interest earned"),
    ("Penalties and settlements", AccountType::OtherExpense, "Penalties and settlements"),
    ("Reconciliation Discrepancies", AccountType::OtherExpense, "Other Miscellaneous Expense"),
];

/// Demo statement: (date, description, amount).
const STATEMENT: &[(&str, &str, &str)] = &[
    ("2026-01-05", "Payment from SWCHC", "610.20"),
    ("2026-01-15", "QuickBooks Payments Fee", "-17.95"),
    ("2026-02-02", "Payment from Yasminder Dhillon", "452.00"),
    ("2026-02-09", "QuickBooks Payments Fee", "-14.75"),
    ("2026-02-20", "Payment from Michel Sturgeon", "1,017.00"),
    ("2026-02-27", "HYDRO ONE", "(86.40)"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info,seeder=info".into()),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let org = OrganizationRepository::new(db.clone())
        .create(ACTOR, "Northern Lights Coaching")
        .await?;
    let org_id = OrganizationId::from_uuid(org.id);
    info!(organization_id = %org_id, "Seeded organization");

    let accounts = AccountRepository::new(db.clone());
    let mut created = 0_usize;
    for (name, account_type, detail_type) in CHART {
        let input = CreateAccountInput {
            name: (*name).to_string(),
            account_type: *account_type,
            detail_type: Some((*detail_type).to_string()),
        };
        match accounts.create(org_id, ACTOR, input).await {
            Ok(_) => created += 1,
            Err(RepositoryError::Conflict(message)) => info!(%message, "Skipping account"),
            Err(e) => return Err(e.into()),
        }
    }
    info!(created, "Seeded chart of accounts");

    let chart = accounts.list(org_id, &AccountFilter::default()).await?;
    let bank = account_named(&chart, BANK_ACCOUNT)?;
    let fees = account_named(&chart, "Payment Processing Fees")?;

    BankRuleRepository::new(db.clone())
        .create(
            org_id,
            ACTOR,
            CreateBankRuleInput {
                name: "Payment processor fees".to_string(),
                priority: 10,
                conditions: vec![RuleCondition {
                    field: RuleField::Description,
                    operator: RuleOperator::Contains,
                    value: "payments fee".to_string(),
                }],
                assign_account: Some(fees),
                assign_payee: Some("QuickBooks Payments".to_string()),
                auto_confirm: true,
                is_active: true,
            },
        )
        .await?;

    let invoice = InvoiceRepository::new(db.clone())
        .create(
            org_id,
            ACTOR,
            CreateInvoiceInput {
                invoice_number: None,
                customer: "Yasminder Dhillon".to_string(),
                issue_date: date(2026, 1, 20)?,
                due_date: date(2026, 2, 19)?,
                subtotal: Decimal::new(40_000, 2),
                tax_code: Some("HST-ON".to_string()),
                income_account: None,
                status: Some(InvoiceStatus::Sent),
            },
        )
        .await?;
    info!(invoice_number = %invoice.invoice_number, "Seeded invoice");

    let rows: Vec<RawStatementRow> = STATEMENT
        .iter()
        .map(|(date, description, amount)| RawStatementRow {
            date: (*date).to_string(),
            description: (*description).to_string(),
            amount: (*amount).to_string(),
        })
        .collect();

    let transactions =
        BankTransactionRepository::new(db.clone()).with_config(config.reconciliation.clone());
    let imported = transactions.import(org_id, ACTOR, bank, &rows).await?;
    let rules = transactions.apply_rules(org_id, ACTOR, Some(bank)).await?;
    let matched = transactions.auto_match(org_id, ACTOR, bank).await?;

    info!(
        imported = imported.imported,
        categorized = rules.categorized,
        matched = matched.matched,
        "Seeding complete"
    );
    Ok(())
}

fn account_named(chart: &[accounts::Model], name: &str) -> anyhow::Result<AccountId> {
    chart
        .iter()
        .find(|account| account.name == name)
        .map(|account| AccountId::from_uuid(account.id))
        .with_context(|| format!("account '{name}' missing after seeding"))
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}
