//! The route handler for setting the monthly base budget.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::Claims,
    budget::core::{Budget, upsert_budget},
    transaction::MonthKey,
};

/// The request body for setting a budget.
///
/// Both fields are optional at the type level so that a missing field can be
/// reported as a 400 with a message, rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SetBudgetRequest {
    /// The calendar month, as a `"YYYY-MM"` string.
    pub month: Option<String>,
    /// The base amount to assign to the month.
    pub amount: Option<f64>,
}

/// A route handler that creates or replaces the caller's budget for a month.
///
/// Repeated calls with the same inputs converge to the same stored record.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn set_budget_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Json(request): Json<SetBudgetRequest>,
) -> Result<Json<Budget>, Error> {
    let (Some(month), Some(amount)) = (request.month, request.amount) else {
        return Err(Error::MissingBudgetFields);
    };

    if !amount.is_finite() {
        return Err(Error::InvalidAmount);
    }

    let month: MonthKey = month.parse()?;

    let connection = state.db_connection.lock().unwrap();
    let budget = upsert_budget(claims.user_id(), month, amount, &connection)?;

    tracing::info!(
        "Set budget for month {month} of user {}: {amount}",
        claims.username
    );

    Ok(Json(budget))
}

#[cfg(test)]
mod endpoint_tests {
    use serde_json::json;

    use crate::{endpoints, test_utils::test_server_with_user};

    #[tokio::test]
    async fn set_budget_returns_the_record() {
        let (server, token, _guard) = test_server_with_user().await;

        let response = server
            .post(endpoints::BUDGET)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({ "month": "2026-01", "amount": 500.0 }))
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["month"], "2026-01");
        assert_eq!(body["baseAmount"], 500.0);
    }

    #[tokio::test]
    async fn set_budget_requires_month_and_amount() {
        let (server, token, _guard) = test_server_with_user().await;

        for body in [json!({ "month": "2026-01" }), json!({ "amount": 500.0 })] {
            server
                .post(endpoints::BUDGET)
                .authorization_bearer(&token)
                .content_type("application/json")
                .json(&body)
                .await
                .assert_status_bad_request();
        }
    }

    #[tokio::test]
    async fn set_budget_rejects_malformed_months() {
        let (server, token, _guard) = test_server_with_user().await;

        server
            .post(endpoints::BUDGET)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({ "month": "enero", "amount": 500.0 }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn set_budget_requires_authentication() {
        let (server, _, _guard) = test_server_with_user().await;

        server
            .post(endpoints::BUDGET)
            .content_type("application/json")
            .json(&json!({ "month": "2026-01", "amount": 500.0 }))
            .await
            .assert_status_unauthorized();
    }
}
