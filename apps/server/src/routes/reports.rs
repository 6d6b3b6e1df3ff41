//! # Report Routes
//!
//! ```text
//!  GET /api/reports?from=&to=   period report (defaults to month-to-date)
//!  GET /api/dashboard           today's figures, dues, low stock
//!  GET /api/export              full JSON backup, served as a download
//!  POST /api/import             restore a backup, replacing the shop's data
//! ```
//!
//! Dates are UTC calendar dates.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use shopkeep_core::{DashboardSummary, PeriodReport};
use shopkeep_db::{ImportSummary, ShopExport};
use tracing::info;

use crate::auth::AuthShop;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports", get(period_report))
        .route("/dashboard", get(dashboard))
        .route("/export", get(export))
        .route("/import", post(import))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn period_report(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<PeriodReport>> {
    let today = Utc::now().date_naive();
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to.with_day(1).unwrap_or(to));

    Ok(Json(
        state.db.reports().period_report(&shop.shop_id, from, to).await?,
    ))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
) -> ApiResult<Json<DashboardSummary>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.db.reports().dashboard(&shop.shop_id, today).await?))
}

async fn export(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
) -> ApiResult<impl IntoResponse> {
    let backup = state.db.reports().export(&shop.shop_id).await?;
    let disposition = format!(
        "attachment; filename=\"shopkeep-backup-{}.json\"",
        backup.exported_at.format("%Y-%m-%d")
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(backup)))
}

async fn import(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(backup): Json<ShopExport>,
) -> ApiResult<Json<ImportSummary>> {
    info!(shop_id = %shop.shop_id, exported_at = %backup.exported_at, "Restoring backup");
    Ok(Json(state.db.reports().import(&shop.shop_id, &backup).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_reports_dashboard_and_export() {
        let app = TestApp::signed_up().await;
        let tea = app.add_stock("TEA-250", 8_000, 10_000, 3).await;
        let today = Utc::now().date_naive().to_string();

        app.post(
            "/api/sales",
            json!({
                "customer": { "kind": "new", "name": "Asha" },
                "items": [{ "stockItemId": tea, "quantity": 2 }],
                "taxRateBps": 0,
                "amountPaidCents": 15_000,
            }),
        )
        .await;
        app.post(
            "/api/expenses",
            json!({ "date": today, "title": "Tea for staff", "category": "Misc", "amountCents": 500 }),
        )
        .await;

        let (status, report) = app
            .get(&format!("/api/reports?from={}&to={}", today, today))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["revenue"], 20_000);
        assert_eq!(report["grossProfit"], 4_000);
        assert_eq!(report["netProfit"], 3_500);
        assert_eq!(report["outstandingDue"], 5_000);

        let (_, month) = app.get("/api/reports").await;
        assert_eq!(month["saleCount"], 1);

        let (status, dashboard) = app.get("/api/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["todaySaleCount"], 1);
        assert_eq!(dashboard["totalDues"], 5_000);
        assert_eq!(dashboard["lowStock"].as_array().unwrap().len(), 1);

        let (status, backup) = app.get("/api/export").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(backup["sales"].as_array().unwrap().len(), 1);
        assert_eq!(backup["shop"]["email"], "owner@example.com");
        assert!(backup["shop"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_export_then_import_into_a_fresh_shop() {
        let source = TestApp::signed_up().await;
        let rice = source.add_stock("RICE-5KG", 40_000, 52_500, 10).await;
        source
            .put("/api/settings", json!({ "shopName": "Ravi Stores", "defaultTaxBps": 0 }))
            .await;
        for paid in [100_000, 30_000] {
            let (status, body) = source
                .post(
                    "/api/sales",
                    json!({
                        "customer": { "kind": "new", "name": "Asha" },
                        "items": [{ "stockItemId": rice, "quantity": 2 }],
                        "amountPaidCents": paid,
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
        }
        let (_, backup) = source.get("/api/export").await;

        let target = TestApp::signed_up().await;
        let (status, summary) = target.post("/api/import", backup).await;
        assert_eq!(status, StatusCode::OK, "{}", summary);
        assert_eq!(summary["stock"], 1);
        assert_eq!(summary["customers"], 2);
        assert_eq!(summary["sales"], 2);
        assert_eq!(summary["nextInvoiceNumber"], 3);

        let (_, settings) = target.get("/api/settings").await;
        assert_eq!(settings["shopName"], "Ravi Stores");
        let (_, stock) = target.get("/api/stock").await;
        assert_eq!(stock[0]["stock"], 6);
        let (_, due) = target.get("/api/sales?due=true").await;
        assert_eq!(due.as_array().unwrap().len(), 2);
        assert_eq!(due[1]["invoiceNumber"], 2);
        assert_eq!(due[1]["dueCents"], 75_000);

        let (status, body) = target
            .post("/api/import", json!({ "version": 99 }))
            .await;
        assert!(status.is_client_error(), "{}", body);
    }

    #[tokio::test]
    async fn test_inverted_range_is_a_validation_error() {
        let app = TestApp::signed_up().await;
        let (status, body) = app.get("/api/reports?from=2024-03-31&to=2024-03-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
