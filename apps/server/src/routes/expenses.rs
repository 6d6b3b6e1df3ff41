//! Expense log routes.
//!
//! `GET /api/expenses?from=2024-03-01&to=2024-03-31` filters by the
//! expense's own date; without both bounds every expense is returned.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use shopkeep_core::{Expense, NewExpense};

use crate::auth::AuthShop;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/{id}", delete(delete_expense))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Query(query): Query<ExpenseQuery>,
) -> ApiResult<Json<Vec<Expense>>> {
    let expenses = match (query.from, query.to) {
        (Some(from), Some(to)) => {
            state
                .db
                .expenses()
                .list_between(&shop.shop_id, from, to)
                .await?
        }
        (None, None) => state.db.expenses().list(&shop.shop_id).await?,
        _ => return Err(ApiError::validation("from and to must be given together")),
    };
    Ok(Json(expenses))
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(new): Json<NewExpense>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let expense = state.db.expenses().create(&shop.shop_id, &new).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.expenses().delete(&shop.shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
