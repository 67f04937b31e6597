//! Password validation and hashing.

use crate::Error;

/// A password that has passed the strength check.
///
/// Keeping validation separate from hashing lets callers (e.g. the password
/// reset CLI) report weak passwords before doing any expensive work.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// # Errors
    /// Returns an [Error::TooWeak] if the password is too easy to guess.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let entropy = zxcvbn::zxcvbn(raw_password, &[]);

        if entropy.score() < zxcvbn::Score::Three {
            let reason = entropy
                .feedback()
                .and_then(|feedback| feedback.warning())
                .map(|warning| warning.to_string())
                .unwrap_or_else(|| "add another word or two".to_string());

            return Err(Error::TooWeak(reason));
        }

        Ok(Self(raw_password.to_string()))
    }

    /// Create a validated password without checking its strength.
    ///
    /// Only for tests and code paths that re-wrap an already validated
    /// password.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_string())
    }
}

impl AsRef<str> for ValidatedPassword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A bcrypt hash of a user's password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a validated password.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the underlying hashing library
    /// fails. The error string should only be logged on the server.
    pub fn new(password: &ValidatedPassword) -> Result<Self, Error> {
        bcrypt::hash(password.as_ref(), bcrypt::DEFAULT_COST)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string, e.g. one loaded from the database.
    pub fn new_unchecked(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// Whether `password` matches this hash.
    ///
    /// # Errors
    /// Returns an [Error::HashingError] if the stored hash cannot be parsed.
    pub fn verify(&self, password: &str) -> Result<bool, Error> {
        bcrypt::verify(password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
