//! Application router configuration.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{log_in_endpoint, register_endpoint},
    budget::set_budget_endpoint,
    endpoints,
    logging::logging_middleware,
    report::excel_report_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Handlers taking a [crate::auth::Claims] argument guard themselves; the
/// auth routes, the health probe, and the static files are open.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::BUDGET, post(set_budget_endpoint))
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::EXCEL_REPORT, get(excel_report_endpoint))
        .nest_service(endpoints::UPLOADS, ServeDir::new(&state.uploads_dir))
        .fallback_service(ServeDir::new(&state.static_dir))
        // Receipt images may be a few megabytes; the axum default of 2 MB is
        // too tight.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// A route handler for the liveness probe.
async fn get_health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

#[cfg(test)]
mod routing_tests {
    use crate::{endpoints, test_utils::test_server};

    #[tokio::test]
    async fn health_check_responds_ok() {
        let (server, _guard) = test_server();

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["status"], "OK");
    }

    #[tokio::test]
    async fn unknown_api_route_is_not_found() {
        let (server, _guard) = test_server();

        server.get("/api/nope").await.assert_status_not_found();
    }
}
