use thiserror::Error;

/// Failure kinds surfaced by token encoding and decoding.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing passphrase")]
    MissingSecret,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("unsupported token version: {0}")]
    UnsupportedVersion(String),

    /// Wrong passphrase, wrong KDF parameters, or tampered data.
    /// Deliberately carries no detail.
    #[error("token authentication failed")]
    AuthenticationFailed,

    #[error("failed to encode payload: {0}")]
    PayloadEncoding(#[source] serde_json::Error),

    #[error("failed to decode payload: {0}")]
    PayloadDecoding(#[source] serde_json::Error),

    #[error("invalid scrypt parameters: {0}")]
    InvalidKdfParams(String),

    #[error("OS random generator unavailable")]
    RandomUnavailable,

    #[error("encryption failed")]
    EncryptionFailed,
}

impl TokenError {
    /// Returns `true` for failures caused by the token text itself rather
    /// than by the secret or the configuration.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TokenError::MalformedToken(_) | TokenError::UnsupportedVersion(_)
        )
    }
}
