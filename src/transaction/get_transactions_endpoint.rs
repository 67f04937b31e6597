//! The route handler for the month-filtered transaction summary.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::Claims,
    transaction::{
        month::MonthKey,
        summary::{MonthlySummary, summarize},
    },
};

/// The query parameters of the transactions endpoint.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// The calendar month to summarize, as a `"YYYY-MM"` string.
    pub month: Option<String>,
}

/// A route handler that returns the caller's transactions and budget for one
/// calendar month, with income/expense totals and the final balance.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_transactions_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, Error> {
    let month: MonthKey = query.month.ok_or(Error::MissingMonth)?.parse()?;

    let connection = state.db_connection.lock().unwrap();
    let summary = summarize(claims.user_id(), month, &connection)?;

    Ok(Json(summary))
}
