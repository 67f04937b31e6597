//! The route handler for creating a transaction from a multipart form.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    auth::Claims,
    receipt::save_receipt,
    transaction::core::{
        NewTransaction, Transaction, TransactionKind, create_transaction, parse_date,
    },
};

/// The field values collected from the multipart form.
#[derive(Debug, Default)]
struct TransactionForm {
    date: Option<String>,
    kind: Option<String>,
    amount: Option<String>,
    description: Option<String>,
    category: Option<String>,
    receipt: Option<ReceiptUpload>,
}

#[derive(Debug)]
struct ReceiptUpload {
    content_type: Option<String>,
    data: Vec<u8>,
}

/// A route handler that records a new transaction for the caller, with an
/// optional receipt image.
///
/// The form is multipart so the receipt can travel with the text fields:
/// `date`, `kind` (`income`/`expense`), `amount`, `description`, `category`,
/// and the file field `receipt`.
///
/// The receipt is written to disk only after the text fields validate, so a
/// rejected request never leaves an orphaned file behind.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let form = read_form(multipart).await?;

    let date = parse_date(&require_field(form.date, "date")?)?;
    let kind = parse_kind(&require_field(form.kind, "kind")?)?;
    let amount = require_field(form.amount, "amount")?
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount)?;
    let description = require_field(form.description, "description")?;
    let category = form.category.unwrap_or_default();

    // Validate before touching the file system.
    let mut fields = NewTransaction::new(date, kind, amount, description, category, None)?;

    if let Some(receipt) = form.receipt {
        let receipt_url = save_receipt(
            &receipt.data,
            receipt.content_type.as_deref(),
            &state.uploads_dir,
        )?;
        fields.receipt_url = Some(receipt_url);
    }

    let connection = state.db_connection.lock().unwrap();
    let transaction = create_transaction(fields, claims.user_id(), &connection)?;

    tracing::info!(
        "Created transaction {} for user {}",
        transaction.id,
        claims.username
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn read_form(mut multipart: Multipart) -> Result<TransactionForm, Error> {
    let mut form = TransactionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        match field.name() {
            Some("date") => form.date = Some(field_text(field).await?),
            Some("kind") => form.kind = Some(field_text(field).await?),
            Some("amount") => form.amount = Some(field_text(field).await?),
            Some("description") => form.description = Some(field_text(field).await?),
            Some("category") => form.category = Some(field_text(field).await?),
            Some("receipt") => {
                let content_type = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;

                // An empty file input still submits a zero-byte part.
                if !data.is_empty() {
                    form.receipt = Some(ReceiptUpload {
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn field_text(field: Field<'_>) -> Result<String, Error> {
    field
        .text()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))
}

fn require_field(value: Option<String>, name: &str) -> Result<String, Error> {
    value.ok_or_else(|| Error::MultipartError(format!("missing form field \"{name}\"")))
}

fn parse_kind(text: &str) -> Result<TransactionKind, Error> {
    match text {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        other => Err(Error::MultipartError(format!(
            "invalid transaction kind \"{other}\""
        ))),
    }
}

#[cfg(test)]
mod endpoint_tests {
    use crate::{
        endpoints,
        test_utils::{multipart_body, test_server_with_user},
    };

    #[tokio::test]
    async fn create_returns_201_and_the_record() {
        let (server, token, _guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15T12:00:00Z"),
                ("kind", "expense"),
                ("amount", "45.5"),
                ("description", "Mercado"),
                ("category", "Comida"),
            ],
            None,
        );

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created = response.json::<serde_json::Value>();
        assert_eq!(created["kind"], "expense");
        assert_eq!(created["amount"], 45.5);
        assert_eq!(created["description"], "Mercado");
        assert_eq!(created["category"], "Comida");
        assert!(created["receiptUrl"].is_null() || created.get("receiptUrl").is_none());
    }

    #[tokio::test]
    async fn create_accepts_a_plain_date() {
        let (server, token, _guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15"),
                ("kind", "income"),
                ("amount", "100"),
                ("description", "Sueldo"),
                ("category", "General"),
            ],
            None,
        );

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(
            response.json::<serde_json::Value>()["date"],
            "2026-01-15T00:00:00Z"
        );
    }

    #[tokio::test]
    async fn create_stores_the_receipt() {
        let (server, token, guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15T12:00:00Z"),
                ("kind", "expense"),
                ("amount", "45.5"),
                ("description", "Mercado"),
                ("category", "Comida"),
            ],
            Some(("receipt", "factura.jpg", "image/jpeg", b"not really a jpeg")),
        );

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created = response.json::<serde_json::Value>();
        let receipt_url = created["receiptUrl"].as_str().unwrap();
        assert!(receipt_url.starts_with("/uploads/"));

        let file_name = receipt_url.strip_prefix("/uploads/").unwrap();
        assert!(guard.uploads_dir().join(file_name).exists());
    }

    #[tokio::test]
    async fn create_rejects_non_image_receipts() {
        let (server, token, _guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15T12:00:00Z"),
                ("kind", "expense"),
                ("amount", "45.5"),
                ("description", "Mercado"),
                ("category", "Comida"),
            ],
            Some(("receipt", "notas.txt", "text/plain", b"plain text")),
        );

        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_rejects_negative_amounts() {
        let (server, token, _guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(
            &[
                ("date", "2026-01-15T12:00:00Z"),
                ("kind", "expense"),
                ("amount", "-1"),
                ("description", "Mercado"),
                ("category", "Comida"),
            ],
            None,
        );

        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type(&content_type)
            .bytes(body.into())
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_requires_authentication() {
        let (server, _, _guard) = test_server_with_user().await;
        let (content_type, body) = multipart_body(&[("date", "2026-01-15")], None);

        server
            .post(endpoints::TRANSACTIONS)
            .content_type(&content_type)
            .bytes(body.into())
            .await
            .assert_status_unauthorized();
    }
}
