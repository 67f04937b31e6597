//! Helpers shared by the endpoint tests.

use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use crate::{AppState, build_router, endpoints};

/// A password strong enough to pass the registration strength check.
pub const TEST_PASSWORD: &str = "morado-elefante-laser-disco-42";

/// Keeps the temporary uploads directory alive for the duration of a test.
pub struct TestGuard {
    uploads: TempDir,
}

impl TestGuard {
    /// The directory receipts are written to.
    pub fn uploads_dir(&self) -> &std::path::Path {
        self.uploads.path()
    }
}

/// A test server backed by an in-memory database and a temporary uploads
/// directory.
pub fn test_server() -> (TestServer, TestGuard) {
    let db_connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let uploads = TempDir::new().expect("Could not create a temporary uploads directory.");

    let state = AppState::new(
        db_connection,
        "42",
        uploads.path().to_path_buf(),
        uploads.path().join("static"),
    )
    .expect("Could not initialize the database.");

    let server = TestServer::try_new(build_router(state)).expect("Could not create test server.");

    (server, TestGuard { uploads })
}

/// A test server with a registered, signed-in user named "tester".
pub async fn test_server_with_user() -> (TestServer, String, TestGuard) {
    let (server, guard) = test_server();
    let token = register_and_log_in(&server, "tester").await;

    (server, token, guard)
}

/// Register `username` and sign in, returning the bearer token.
pub async fn register_and_log_in(server: &TestServer, username: &str) -> String {
    server
        .post(endpoints::REGISTER)
        .content_type("application/json")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post(endpoints::LOG_IN)
        .content_type("application/json")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.json::<serde_json::Value>()["token"]
        .as_str()
        .expect("sign-in response should carry a token")
        .to_owned()
}

/// Create a transaction through the API and return the created record.
pub async fn create_test_transaction(
    server: &TestServer,
    token: &str,
    kind: &str,
    amount: f64,
    date: &str,
) -> serde_json::Value {
    let (content_type, body) = multipart_body(
        &[
            ("date", date),
            ("kind", kind),
            ("amount", &amount.to_string()),
            ("description", "Test"),
            ("category", "General"),
        ],
        None,
    );

    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .content_type(&content_type)
        .bytes(body.into())
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json()
}

/// Build a `multipart/form-data` body by hand: text fields plus an optional
/// `(name, filename, content type, data)` file part.
///
/// Returns the content type (with boundary) and the body bytes.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((name, file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={BOUNDARY}"),
        body,
    )
}
