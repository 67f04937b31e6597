//! JSON Web Token creation, validation, and extraction.

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{AppState, user::{User, UserId}};

/// How long an issued token stays valid.
const TOKEN_DURATION: Duration = Duration::hours(8);

/// The contents of a JSON Web Token.
///
/// Any route handler that takes `Claims` as an argument is protected: the
/// extractor rejects requests without a valid bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the authenticated user.
    pub sub: i64,
    /// The username of the authenticated user.
    pub username: String,
    /// The time the token was issued, as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The ID of the authenticated user.
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let state = AppState::from_ref(state);

        decode_token(bearer.token(), &state.decoding_key)
    }
}

/// The errors that may occur while authenticating a request.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// The request carried no `Authorization: Bearer` header.
    MissingToken,
    /// The token was expired, malformed, or signed with another key.
    InvalidToken,
    /// The token could not be created (an internal error).
    TokenCreation,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing access token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::TokenCreation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Create a signed token for `user`.
pub fn encode_token(user: &User, encoding_key: &EncodingKey) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user.id.as_i64(),
        username: user.username.clone(),
        iat: now.unix_timestamp() as usize,
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("Could not encode token: {error}");
        AuthError::TokenCreation
    })
}

/// Validate `token` and return its claims.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, AuthError> {
    decode(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{DecodingKey, EncodingKey};

    use crate::{
        PasswordHash,
        user::{User, UserId},
    };

    use super::{AuthError, decode_token, encode_token};

    fn test_user() -> User {
        User {
            id: UserId::new(7),
            username: "tester".to_string(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn round_trips_the_user() {
        let user = test_user();
        let encoding_key = EncodingKey::from_secret(b"42");
        let decoding_key = DecodingKey::from_secret(b"42");

        let token = encode_token(&user, &encoding_key).unwrap();
        let claims = decode_token(&token, &decoding_key).unwrap();

        assert_eq!(claims.user_id(), user.id);
        assert_eq!(claims.username, user.username);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_tokens_signed_with_another_key() {
        let token = encode_token(&test_user(), &EncodingKey::from_secret(b"42")).unwrap();

        let result = decode_token(&token, &DecodingKey::from_secret(b"not 42"));

        assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn rejects_garbage_tokens() {
        let result = decode_token("definitely.not.a-token", &DecodingKey::from_secret(b"42"));

        assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
    }
}
