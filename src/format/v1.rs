//! Token format v1.
//!
//! V1 Token Format:
//! ```text
//! "v1" . SALT (16, b64url) . NONCE (12, b64url) . CIPHERTEXT+TAG (b64url)
//! ```

use super::{SEPARATOR, b64u_decode, b64u_encode};
use crate::{
    crypto::{AeadBlob, NONCE_LEN, SALT_LEN},
    error::TokenError,
};

/// Version tag of this format.
pub const VERSION_V1: &str = "v1";

/// Parses the salt, nonce and ciphertext fields of a v1 token.
///
/// # Errors
///
/// Returns [`TokenError::MalformedToken`] on invalid base64url or when the
/// decoded salt or nonce has the wrong length.
pub fn parse(fields: &[&str]) -> Result<AeadBlob, TokenError> {
    let [salt, nonce, ciphertext] = fields else {
        return Err(TokenError::MalformedToken("expected 4 dot-separated fields"));
    };

    let salt: [u8; SALT_LEN] = b64u_decode(salt)?
        .try_into()
        .map_err(|_| TokenError::MalformedToken("invalid salt length"))?;

    let nonce: [u8; NONCE_LEN] = b64u_decode(nonce)?
        .try_into()
        .map_err(|_| TokenError::MalformedToken("invalid nonce length"))?;

    let ciphertext = b64u_decode(ciphertext)?;

    Ok(AeadBlob::new(salt, nonce, ciphertext))
}

/// Serializes a blob to a v1 token.
pub fn serialize(blob: &AeadBlob) -> String {
    let mut token = String::from(VERSION_V1);
    for field in [&blob.salt()[..], &blob.nonce()[..], blob.ciphertext()] {
        token.push(SEPARATOR);
        token.push_str(&b64u_encode(field));
    }
    token
}
