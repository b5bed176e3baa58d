//! Token text format.
//!
//! A token is four dot-separated fields:
//! ```text
//! VERSION . SALT_B64URL . NONCE_B64URL . CIPHERTEXT_B64URL
//! ```
//! Field count is checked first, then the version tag, and only then are the
//! remaining fields handed to the version-specific parser.

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::{crypto::AeadBlob, error::TokenError};

pub mod v1;

/// Field separator.
pub const SEPARATOR: char = '.';
/// Number of fields in every token.
pub const FIELD_COUNT: usize = 4;
/// Latest format version
pub const CURRENT_VERSION: &str = v1::VERSION_V1;

/// URL-safe alphabet, unpadded on encode, padding optional on decode.
const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub(crate) fn b64u_encode(raw: &[u8]) -> String {
    B64URL.encode(raw)
}

pub(crate) fn b64u_decode(field: &str) -> Result<Vec<u8>, TokenError> {
    B64URL
        .decode(field)
        .map_err(|_| TokenError::MalformedToken("invalid base64url field"))
}

/// Parses a token and returns its blob.
///
/// Automatically dispatches to the appropriate version parser.
///
/// # Errors
///
/// Returns an error if:
/// - The token does not have exactly four non-empty fields
/// - The version is unsupported
/// - A field is not base64url or has the wrong decoded length
pub fn parse(token: &str) -> Result<AeadBlob, TokenError> {
    let fields: Vec<&str> = token.split(SEPARATOR).collect();

    if fields.len() != FIELD_COUNT {
        return Err(TokenError::MalformedToken("expected 4 dot-separated fields"));
    }
    if fields.iter().any(|f| f.is_empty()) {
        return Err(TokenError::MalformedToken("empty field"));
    }

    match fields[0] {
        v1::VERSION_V1 => v1::parse(&fields[1..]),
        other => Err(TokenError::UnsupportedVersion(other.to_string())),
    }
}

/// Serializes a blob to the current token version.
pub fn serialize(blob: &AeadBlob) -> String {
    v1::serialize(blob)
}

/// Returns the version tag of a token without validating the rest of it.
pub fn version_of(token: &str) -> Option<&str> {
    token.split(SEPARATOR).next().filter(|v| !v.is_empty())
}
