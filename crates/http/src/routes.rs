//! Route table. Everything is served under `/api`.

use crate::controllers::{addresses, auth, books, carts, chatbot, health, manage, orders, payments, users};
use crate::middleware::throttle_chatbot;
use crate::state::AppState;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

fn book_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(books::index)
                .post(books::create)
                .patch(books::update)
                .delete(books::destroy),
        )
        .route("/book", get(books::show))
        .route("/search", get(books::search))
        .route("/searchTitle", get(books::search_title))
}

fn manage_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(manage::dashboard_stats))
        .route("/get-all-users", get(manage::all_users))
        .route("/get-all-customers", get(manage::all_customers))
        .route("/get-all-employees", get(manage::all_employees))
        .route("/search/users", get(manage::search_users))
        .route("/search/customers", get(manage::search_customers))
        .route("/search/employees", get(manage::search_employees))
        .route("/user", post(manage::create_user).patch(manage::update_user))
        .route("/user/:id", delete(manage::delete_user))
        .route(
            "/books",
            get(manage::books_index)
                .post(books::create)
                .patch(books::update)
                .delete(books::destroy),
        )
        .route("/books/book", get(manage::book_show))
        .route("/books/search", get(manage::books_search))
        .route("/books/searchTitle", get(manage::books_search_title))
        .route("/orders", get(manage::orders_index))
        .route("/orders/search", get(manage::orders_search))
        .route("/orders/by-code/:code", get(manage::order_by_code))
        .route("/orders/:id", get(manage::order_show))
        .route("/orders/:id/status", patch(manage::order_status))
        .route("/orders/:id/payment-status", patch(manage::order_payment_status))
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .nest("/books", book_routes())
        // auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/change-password", post(auth::change_password))
        // addresses
        .route("/addresses", get(addresses::index).post(addresses::create))
        .route("/addresses/:id", patch(addresses::update).delete(addresses::destroy))
        // carts
        .route("/carts/books/:book_id/quantity/:quantity", post(carts::add_book))
        .route("/carts/users/cart", get(carts::show))
        .route("/carts/book/:book_id/quantity/:operation", patch(carts::change_quantity))
        .route("/carts/book/:book_id", delete(carts::remove_book))
        .route("/carts/total-items", get(carts::total_items))
        // orders
        .route("/order/users/payments/:payment_method", post(orders::place_order))
        .route("/order", get(orders::index))
        .route("/order/:id", get(orders::show))
        .route("/order/:id/status", patch(orders::update_status))
        .route("/orders/by-code/:code", get(orders::by_code))
        // self-service
        .route("/user/me", get(users::me).patch(users::update_me))
        .route("/user/my-orders", get(users::my_orders))
        .nest("/manage", manage_routes())
        // payments
        .route("/payments/vnpay/create", post(payments::create))
        .route("/payments/vnpay/return", get(payments::return_url))
        .route("/payments/vnpay/ipn", get(payments::ipn))
        .route(
            "/chatbot/ask",
            post(chatbot::ask).route_layer(from_fn_with_state(state.clone(), throttle_chatbot)),
        )
}

/// CORS for the configured storefront origins; `*` or an empty list allows any origin without credentials
pub fn cors_layer(origins: &[String], credentials: bool) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .max_age(Duration::from_secs(3600));

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter(|origin| !origin.is_empty() && origin.as_str() != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    layer
        .allow_origin(AllowOrigin::list(parsed))
        .allow_credentials(credentials)
}

/// The full application with state and the shared middleware stack applied
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins(), state.config.cors_credentials);

    Router::new()
        .nest("/api", api_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        let _ = cors_layer(&["*".to_string()], true);
        let _ = cors_layer(&[], false);
        let _ = cors_layer(
            &["https://shop.example.com".to_string(), "http://localhost:3000".to_string()],
            true,
        );
    }
}
