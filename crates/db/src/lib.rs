//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - A portable migration for Postgres and SQLite
//!
//! Every mutation runs in one serializable transaction together with its
//! audit entry.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AccountRepository, AuditRepository, BankRuleRepository, BankTransactionRepository,
    ExpenseRepository, InvoiceRepository, JournalRepository, OrganizationRepository,
    ReconciliationRepository, ReportRepository, RepositoryError, TaxRepository,
};

use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel,
    TransactionTrait,
};
use tally_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Begins a serializable transaction.
///
/// # Errors
///
/// Returns an error if the transaction cannot be started.
pub async fn begin_serializable(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    db.begin_with_config(Some(IsolationLevel::Serializable), None)
        .await
}
