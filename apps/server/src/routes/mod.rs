//! # HTTP Routes
//!
//! ## Route Organization
//! ```text
//! routes/
//! ├── mod.rs        ◄─── You are here (router assembly)
//! ├── health.rs     ◄─── /health
//! ├── auth.rs       ◄─── signup, login, refresh
//! ├── settings.rs   ◄─── invoice header, default tax
//! ├── stock.rs      ◄─── stock items, SKU generation
//! ├── customers.rs  ◄─── customers, purchase history
//! ├── sales.rs      ◄─── record sale, due payments, invoice text
//! ├── expenses.rs   ◄─── expense log
//! └── reports.rs    ◄─── period report, dashboard, export
//! ```
//!
//! ## How Handlers Look
//! ```rust,ignore
//! async fn list_stock(
//!     State(state): State<Arc<AppState>>,   ◄── shared Database + JwtManager
//!     shop: AuthShop,                       ◄── 401 unless a valid access token
//!     Query(query): Query<StockQuery>,
//! ) -> ApiResult<Json<Vec<StockItem>>>
//! ```

use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub mod auth;
pub mod customers;
pub mod expenses;
pub mod health;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod stock;

/// Everything mounted under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(auth::router())
        .merge(settings::router())
        .merge(stock::router())
        .merge(customers::router())
        .merge(sales::router())
        .merge(expenses::router())
        .merge(reports::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use shopkeep_db::{Database, DbConfig};
    use tower::ServiceExt;

    use crate::{build_router, AppState, ServerConfig};

    const BODY_LIMIT: usize = 1_048_576;

    /// Router over a fresh in-memory database.
    pub struct TestApp {
        pub router: Router,
        pub token: Option<String>,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            let state = Arc::new(AppState::new(db, ServerConfig::default()));
            TestApp {
                router: build_router(state),
                token: None,
            }
        }

        /// A fresh app with one signed-up shop whose token is attached to
        /// every request.
        pub async fn signed_up() -> Self {
            let mut app = Self::new().await;
            let (status, body) = app
                .send(
                    Method::POST,
                    "/api/auth/signup",
                    Some(json!({ "email": "owner@example.com", "password": "hunter22" })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            app.token = Some(body["accessToken"].as_str().unwrap().to_string());
            app
        }

        pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let (status, bytes) = self.raw(method, uri, body).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        pub async fn text(&self, uri: &str) -> (StatusCode, String) {
            let (status, bytes) = self.raw(Method::GET, uri, None).await;
            (status, String::from_utf8(bytes).unwrap())
        }

        async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = &self.token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
            (status, bytes.to_vec())
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::GET, uri, None).await
        }

        pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, Some(body)).await
        }

        pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::PUT, uri, Some(body)).await
        }

        pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Method::DELETE, uri, None).await
        }

        /// Adds a stock item and returns its id.
        pub async fn add_stock(&self, sku: &str, cost: i64, price: i64, qty: i64) -> String {
            let (status, body) = self
                .post(
                    "/api/stock",
                    json!({
                        "sku": sku,
                        "name": format!("Item {}", sku),
                        "category": "General",
                        "costPriceCents": cost,
                        "salePriceCents": price,
                        "quantity": qty,
                        "reorderLevel": 2,
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            body["id"].as_str().unwrap().to_string()
        }
    }
}
