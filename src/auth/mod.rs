//! Token-based authentication: issuing tokens at sign-in and extracting the
//! authenticated user's claims in protected route handlers.

mod log_in_endpoint;
mod register_endpoint;
mod token;

pub use log_in_endpoint::log_in_endpoint;
pub use register_endpoint::register_endpoint;
pub use token::{AuthError, Claims, decode_token, encode_token};
