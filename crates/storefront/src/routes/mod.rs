//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health            - Health check
//!
//! # Cart (JSON)
//! GET  /cart              - Cart view
//! GET  /cart/count        - Cart count badge
//! POST /cart/add          - Add item (JSON body)
//! POST /cart/increment    - One more unit (form: id)
//! POST /cart/decrement    - One less unit, removes at the last (form: id)
//! POST /cart/remove       - Remove item (form: id)
//! POST /cart/checkout     - Send the order
//! ```
//!
//! There is no route that sets a quantity directly.

pub mod cart;

use axum::{
    Router,
    extract::Request,
    http::Uri,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/cart", cart_routes())
}

/// Build the full application: routes, middleware and state.
pub fn app(state: AppState) -> Router {
    routes()
        .fallback(not_found)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
