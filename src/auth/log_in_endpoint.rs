//! The route handler for signing in and issuing a token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::token::encode_token,
    user::get_user_by_username,
};

/// The credentials entered during sign-in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Username entered during sign-in.
    pub username: String,
    /// Password entered during sign-in.
    pub password: String,
}

/// The response body of a successful sign-in.
#[derive(Debug, Serialize)]
pub struct LogInResponse {
    /// The bearer token to send with subsequent requests.
    pub token: String,
    /// The username of the signed-in user, for display.
    pub username: String,
}

/// A route handler that verifies a user's credentials and issues a token.
///
/// An unknown username and a wrong password produce the same response, so
/// callers cannot probe which usernames exist.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn log_in_endpoint(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LogInResponse>, Error> {
    let user = {
        let connection = state.db_connection.lock().unwrap();
        get_user_by_username(&credentials.username, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    if !user.password_hash.verify(&credentials.password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(&user, &state.encoding_key).map_err(|_| Error::TokenCreation)?;

    tracing::info!("User {} signed in", user.username);

    Ok(Json(LogInResponse {
        token,
        username: user.username,
    }))
}
