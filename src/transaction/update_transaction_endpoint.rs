//! The route handler for replacing the editable fields of a transaction.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::Claims,
    database_id::TransactionId,
    transaction::core::{
        NewTransaction, Transaction, TransactionKind, parse_date, update_transaction,
    },
};

/// The request body for updating a transaction.
///
/// All editable fields must be present; the update is a full replace. The
/// stored receipt image is kept as-is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    /// When the transaction happened.
    pub date: String,
    /// Whether this is an income or an expense.
    pub kind: TransactionKind,
    /// The non-negative amount of money moved.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A free-text category label.
    pub category: String,
}

/// A route handler that replaces the editable fields of a transaction owned
/// by the caller.
///
/// Responds with 404 whether the transaction does not exist or belongs to
/// another user, so the API never reveals other users' records.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<TransactionId>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, Error> {
    let fields = NewTransaction::new(
        parse_date(&request.date)?,
        request.kind,
        request.amount,
        request.description,
        request.category,
        None,
    )?;

    let connection = state.db_connection.lock().unwrap();
    let transaction = update_transaction(transaction_id, claims.user_id(), fields, &connection)?;

    Ok(Json(transaction))
}
