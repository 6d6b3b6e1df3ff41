//! # Customer Routes
//!
//! ```text
//!  GET    /api/customers
//!  POST   /api/customers
//!  GET    /api/customers/{id}
//!  PUT    /api/customers/{id}          contact details only
//!  DELETE /api/customers/{id}?force=   422 while dues remain, unless forced
//!  GET    /api/customers/{id}/sales    purchase history
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shopkeep_core::{Customer, CustomerUpdate, NewCustomer, Sale};

use crate::auth::AuthShop;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/sales", get(customer_sales))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: bool,
}

async fn list_customers(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list(&shop.shop_id).await?))
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Json(new): Json<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&shop.shop_id, &new).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&shop.shop_id, &id).await?))
}

async fn update_customer(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
    Json(update): Json<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&shop.shop_id, &id, &update).await?))
}

async fn delete_customer(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    state
        .db
        .customers()
        .delete(&shop.shop_id, &id, query.force)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn customer_sales(
    State(state): State<Arc<AppState>>,
    shop: AuthShop,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Sale>>> {
    Ok(Json(state.db.customers().sales_for(&shop.shop_id, &id).await?))
}
