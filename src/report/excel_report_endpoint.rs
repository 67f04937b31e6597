//! The route handler for downloading the Excel report.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};

use crate::{
    AppState, Error,
    auth::Claims,
    report::excel::{build_report, report_filename},
    user::get_user_by_id,
};

/// The MIME type of an `.xlsx` workbook.
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A route handler that streams the caller's full report as a downloadable
/// `.xlsx` attachment named after the user.
///
/// Generation failures are logged server-side and reported as a generic
/// error; nothing partial is ever streamed because the workbook is built in
/// memory first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn excel_report_endpoint(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<impl IntoResponse, Error> {
    let (bytes, username) = {
        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(claims.user_id(), &connection)?;
        let bytes = build_report(&user, &connection)?;

        (bytes, user.username)
    };

    tracing::info!(
        "Generated Excel report for user {username} ({} bytes)",
        bytes.len()
    );

    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report_filename(&username)),
            ),
        ],
        bytes,
    ))
}
