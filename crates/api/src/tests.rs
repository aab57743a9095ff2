//! Route tests against an in-memory database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tally_db::{
    connect_with,
    migration::{Migrator, MigratorTrait},
};
use tally_shared::config::DatabaseConfig;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, create_router};

const ACTOR: &str = "bookkeeper@example.com";

async fn app() -> Router {
    let db = connect_with(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    create_router(AppState::new(db))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor", ACTOR);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_org(app: &Router) -> String {
    let response = send(
        app,
        "POST",
        "/api/v1/organizations",
        Some(json!({ "name": "Harbour Bicycle Repair" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_str().unwrap().to_string()
}

async fn create_account(app: &Router, org: &str, name: &str, account_type: &str) -> String {
    let response = send(
        app,
        "POST",
        &format!("/api/v1/organizations/{org}/accounts"),
        Some(json!({ "name": name, "accountType": account_type })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let response = app
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_mutation_without_actor_is_rejected() {
    let app = app().await;
    let response = app
        .oneshot(
            Request::post("/api/v1/organizations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "name": "Nobody Ltd" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_reads_do_not_need_actor() {
    let app = app().await;
    let org = create_org(&app).await;

    let response = app
        .oneshot(
            Request::get(format!("/api/v1/organizations/{org}/tax-rates"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let rates = json_body(response).await;
    assert!(!rates.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_and_list_accounts() {
    let app = app().await;
    let org = create_org(&app).await;
    create_account(&app, &org, "Chequing", "Bank").await;

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org}/accounts?account_type=Bank"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let accounts = json_body(response).await;
    let accounts = accounts.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["name"], "Chequing");
    assert_eq!(accounts[0]["balance"], "0.00");
}

#[tokio::test]
async fn test_unknown_account_is_404() {
    let app = app().await;
    let org = create_org(&app).await;

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org}/accounts/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().ends_with("not_found"));
}

#[tokio::test]
async fn test_unbalanced_manual_entry_is_rejected() {
    let app = app().await;
    let org = create_org(&app).await;
    let bank = create_account(&app, &org, "Chequing", "Bank").await;
    let equity = create_account(&app, &org, "Owner Investment", "Equity").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org}/journal/manual"),
        Some(json!({
            "date": "2026-02-01",
            "memo": "Opening balance",
            "lines": [
                { "accountId": bank, "debit": "500.00" },
                { "accountId": equity, "credit": "400.00" }
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unbalanced_entry");

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org}/journal"),
        None,
    )
    .await;
    let page = json_body(response).await;
    assert_eq!(page["meta"]["total"], 0);
}

#[tokio::test]
async fn test_import_counts_duplicates_as_skipped() {
    let app = app().await;
    let org = create_org(&app).await;
    let bank = create_account(&app, &org, "Chequing", "Bank").await;
    let uri = format!("/api/v1/organizations/{org}/bank-transactions/import");
    let payload = json!({
        "accountId": bank,
        "rows": [
            { "date": "2026-03-02", "description": "COFFEE ROASTERS", "amount": "-4.50" },
            { "date": "2026-03-03", "description": "CLIENT E-TRANSFER", "amount": "452.00" }
        ]
    });

    let first = json_body(send(&app, "POST", &uri, Some(payload.clone())).await).await;
    assert_eq!(first["imported"], 2);
    assert_eq!(first["skipped"], 0);

    let second = json_body(send(&app, "POST", &uri, Some(payload)).await).await;
    assert_eq!(second["imported"], 0);
    assert_eq!(second["skipped"], 2);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org}/bank-transactions?status=for_review"),
        None,
    )
    .await;
    let page = json_body(response).await;
    assert_eq!(page["meta"]["total"], 2);
}

#[tokio::test]
async fn test_audit_export_sets_content_type() {
    let app = app().await;
    let org = create_org(&app).await;

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{org}/audit/export?format=csv"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv"
    );
}

fn id_of(page: &Value, description: &str) -> String {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["description"] == description)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_reconciliation_completes_once_statement_agrees() {
    let app = app().await;
    let org = create_org(&app).await;
    let bank = create_account(&app, &org, "Chequing", "Bank").await;
    let base = format!("/api/v1/organizations/{org}");
    send(
        &app,
        "POST",
        &format!("{base}/bank-transactions/import"),
        Some(json!({
            "accountId": bank,
            "rows": [
                { "date": "2026-03-03", "description": "CLIENT E-TRANSFER", "amount": "452.00" },
                { "date": "2026-03-09", "description": "PAYMENTS FEE", "amount": "-14.75" }
            ]
        })),
    )
    .await;
    let page = json_body(send(&app, "GET", &format!("{base}/bank-transactions"), None).await).await;
    let deposit = id_of(&page, "CLIENT E-TRANSFER");
    let fee = id_of(&page, "PAYMENTS FEE");

    let response = send(
        &app,
        "POST",
        &format!("{base}/reconciliations"),
        Some(json!({
            "accountId": bank,
            "startDate": "2026-03-01",
            "endDate": "2026-03-31",
            "statementBalance": "437.25"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = json_body(response).await;
    assert_eq!(session["status"], "in_progress");
    let session = format!("{base}/reconciliations/{}", session["id"].as_str().unwrap());

    let toggle = format!("{session}/toggle/{deposit}");
    let ticked = json_body(send(&app, "POST", &toggle, None).await).await;
    assert_eq!(ticked["isReconciled"], true);

    let response = send(&app, "POST", &format!("{session}/complete"), None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "out_of_balance");

    send(&app, "POST", &format!("{session}/toggle/{fee}"), None).await;
    let workspace = json_body(send(&app, "GET", &session, None).await).await;
    assert_eq!(workspace["reconciledCount"], 2);
    assert_eq!(workspace["clearedBalance"], "437.25");
    assert_eq!(workspace["isBalanced"], true);
    assert_eq!(workspace["transactions"].as_array().unwrap().len(), 2);

    let response = send(&app, "POST", &format!("{session}/complete"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");

    let response = send(&app, "POST", &format!("{session}/toggle/{fee}"), None).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "reconciliation_completed");
}

#[tokio::test]
async fn test_general_ledger_for_one_account() {
    let app = app().await;
    let org = create_org(&app).await;
    let bank = create_account(&app, &org, "Chequing", "Bank").await;
    let equity = create_account(&app, &org, "Owner Investment", "Equity").await;
    let response = send(
        &app,
        "POST",
        &format!("/api/v1/organizations/{org}/journal/manual"),
        Some(json!({
            "date": "2026-02-01",
            "memo": "Opening balance",
            "lines": [
                { "accountId": bank, "debit": "500.00" },
                { "accountId": equity, "credit": "500.00" }
            ]
        })),
    )
    .await;
    assert!(response.status().is_success());

    let response = send(
        &app,
        "GET",
        &format!(
            "/api/v1/organizations/{org}/reports/general-ledger\
             ?start_date=2026-01-01&end_date=2026-12-31&account_id={bank}"
        ),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ledger = json_body(response).await;
    let accounts = ledger["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["name"], "Chequing");
    assert_eq!(accounts[0]["lines"][0]["memo"], "Opening balance");
    assert_eq!(accounts[0]["closingBalance"], "500.00");
}
