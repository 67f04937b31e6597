//! The route handler for registering a new user.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    password::{PasswordHash, ValidatedPassword},
    user::{UserId, create_user},
};

/// The request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// The name to register. Doubles as the display name on reports.
    pub username: String,
    /// The password to register with. Checked for strength before hashing.
    pub password: String,
}

/// The public view of a newly registered user.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    /// The ID of the new user.
    pub id: UserId,
    /// The registered username.
    pub username: String,
}

/// A route handler that registers a new user.
///
/// Rejects duplicate usernames and passwords that are too easy to guess.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_endpoint(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), Error> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(Error::EmptyUsername);
    }

    let password = ValidatedPassword::new(&request.password)?;
    let password_hash = PasswordHash::new(&password)?;

    let connection = state.db_connection.lock().unwrap();
    let user = create_user(username, password_hash, &connection)?;

    tracing::info!("Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            username: user.username,
        }),
    ))
}
