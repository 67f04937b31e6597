//! The route handler for deleting a transaction.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    auth::Claims,
    database_id::TransactionId,
    receipt::remove_receipt,
    transaction::core::{Transaction, delete_transaction},
};

/// A route handler that deletes a transaction owned by the caller and, when
/// the transaction carried a receipt, removes the stored file.
///
/// The database row is the source of truth and is removed first; the file
/// removal is best-effort. A failed cleanup is logged but never fails the
/// request, which can leave an orphaned file behind if the process dies in
/// between.
///
/// Responds with 404 whether the transaction does not exist or belongs to
/// another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let deleted = {
        let connection = state.db_connection.lock().unwrap();
        delete_transaction(transaction_id, claims.user_id(), &connection)?
    };

    if let Some(receipt_url) = &deleted.receipt_url {
        remove_receipt(receipt_url, &state.uploads_dir);
    }

    tracing::info!(
        "Deleted transaction {} of user {}",
        deleted.id,
        claims.username
    );

    Ok(Json(deleted))
}

#[cfg(test)]
mod endpoint_tests {
    use crate::{
        endpoints,
        test_utils::{
            create_test_transaction, multipart_body, register_and_log_in, test_server_with_user,
        },
    };

    #[tokio::test]
    async fn delete_removes_the_transaction() {
        let (server, token, _guard) = test_server_with_user().await;
        let created =
            create_test_transaction(&server, &token, "expense", 45.5, "2026-01-15T12:00:00Z")
                .await;
        let id = created["id"].as_i64().unwrap();

        server
            .delete(&format!("/api/transactions/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let summary = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("month", "2026-01")
            .await
            .json::<serde_json::Value>();
        assert_eq!(summary["transactions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_removes_the_receipt_file() {
        let (server, token, guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15T12:00:00Z"),
                ("kind", "expense"),
                ("amount", "45.5"),
                ("description", "Mercado"),
                ("category", "Comida"),
            ],
            Some(("receipt", "factura.jpg", "image/jpeg", b"fake image bytes")),
        );
        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await
            .json::<serde_json::Value>();
        let id = created["id"].as_i64().unwrap();
        let file_name = created["receiptUrl"]
            .as_str()
            .unwrap()
            .strip_prefix("/uploads/")
            .unwrap()
            .to_owned();
        assert!(guard.uploads_dir().join(&file_name).exists());

        server
            .delete(&format!("/api/transactions/{id}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        assert!(!guard.uploads_dir().join(&file_name).exists());
    }

    #[tokio::test]
    async fn delete_of_missing_transaction_is_404() {
        let (server, token, _guard) = test_server_with_user().await;

        server
            .delete("/api/transactions/4242")
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_of_another_users_transaction_is_404() {
        let (server, token, _guard) = test_server_with_user().await;
        let created =
            create_test_transaction(&server, &token, "expense", 45.5, "2026-01-15T12:00:00Z")
                .await;
        let id = created["id"].as_i64().unwrap();
        let other_token = register_and_log_in(&server, "someone_else").await;

        server
            .delete(&format!("/api/transactions/{id}"))
            .authorization_bearer(&other_token)
            .await
            .assert_status_not_found();

        // The record is still there for its owner.
        let summary = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("month", "2026-01")
            .await
            .json::<serde_json::Value>();
        assert_eq!(summary["transactions"].as_array().unwrap().len(), 1);
    }
}
