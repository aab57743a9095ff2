//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::actor_middleware};

pub mod accounts;
pub mod audit;
pub mod bank_rules;
pub mod bank_transactions;
pub mod expenses;
pub mod health;
pub mod invoices;
pub mod journal;
pub mod organizations;
pub mod reconciliations;
pub mod reports;
pub mod tax;

/// Creates the API router with all routes.
///
/// Everything except the health check passes through the actor middleware.
pub fn api_routes() -> Router<AppState> {
    let books = Router::new()
        .merge(organizations::routes())
        .merge(accounts::routes())
        .merge(journal::routes())
        .merge(invoices::routes())
        .merge(expenses::routes())
        .merge(bank_transactions::routes())
        .merge(bank_rules::routes())
        .merge(reconciliations::routes())
        .merge(reports::routes())
        .merge(audit::routes())
        .merge(tax::routes())
        .layer(middleware::from_fn(actor_middleware));

    Router::new().merge(health::routes()).merge(books)
}
