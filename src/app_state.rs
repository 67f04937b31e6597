//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{Error, db::initialize};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The key used to sign access tokens.
    pub encoding_key: EncodingKey,

    /// The key used to validate access tokens.
    pub decoding_key: DecodingKey,

    /// The directory where uploaded receipt images are stored.
    pub uploads_dir: PathBuf,

    /// The directory the static frontend is served from.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `secret` signs the access tokens, so it must stay
    /// stable across restarts for issued tokens to survive them.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secret: &str,
        uploads_dir: PathBuf,
        static_dir: PathBuf,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            uploads_dir,
            static_dir,
        })
    }
}
