//! Cuentas is a small personal finance tracker for recording income and
//! expense movements, setting a monthly base budget, and exporting monthly
//! Excel reports.
//!
//! This library provides a JSON REST API plus static file serving for the
//! browser frontend.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod password;
mod receipt;
mod report;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserId, get_user_by_username, update_password};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The month query parameter was missing entirely.
    #[error("missing month query parameter (?month=YYYY-MM)")]
    MissingMonth,

    /// The month string did not parse as `"YYYY-MM"`.
    #[error("invalid month \"{0}\", expected the format YYYY-MM")]
    InvalidMonth(String),

    /// The set-budget request was missing the month or the amount.
    #[error("missing data: both month and amount are required")]
    MissingBudgetFields,

    /// A transaction was created or updated with a negative or non-finite
    /// amount.
    #[error("the transaction amount must be a non-negative number")]
    InvalidAmount,

    /// A transaction was created or updated with an empty description.
    #[error("the transaction description cannot be empty")]
    EmptyDescription,

    /// The transaction date string could not be parsed.
    ///
    /// Dates are accepted as RFC 3339 date-times or plain `YYYY-MM-DD` dates.
    #[error("could not parse \"{0}\" as a date")]
    InvalidDate(String),

    /// The uploaded receipt was not an image.
    #[error("only image files are accepted as receipts")]
    NotAnImage,

    /// The username used for registration was empty.
    #[error("the username cannot be empty")]
    EmptyUsername,

    /// The username used for registration is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The username/password combination did not match a registered user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The requested resource was not found, or it belongs to another user.
    ///
    /// The two cases share one error so the API never reveals whether another
    /// user's record exists.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The multipart form for creating a transaction could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A token could not be created for a signed-in user.
    #[error("could not create an access token")]
    TokenCreation,

    /// An error occurred while writing the Excel workbook.
    #[error("could not generate the Excel report: {0}")]
    ExcelError(String),

    /// An error occurred while reading or writing a receipt file.
    #[error("file system error: {0}")]
    IoError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Error::ExcelError(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::IoError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::MissingMonth
            | Error::InvalidMonth(_)
            | Error::MissingBudgetFields
            | Error::InvalidAmount
            | Error::EmptyDescription
            | Error::InvalidDate(_)
            | Error::NotAnImage
            | Error::EmptyUsername
            | Error::DuplicateUsername
            | Error::TooWeak(_)
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation
            | Error::ExcelError(_)
            | Error::IoError(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the server log; the client only gets a
        // generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
