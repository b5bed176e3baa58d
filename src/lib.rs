//! Passphrase-sealed, URL-safe tokens.
//!
//! A payload is serialized to compact JSON, encrypted with AES-256-GCM under
//! a key derived by scrypt from a passphrase and a fresh salt, and packed as
//! `v1.<salt>.<nonce>.<ciphertext>` with unpadded base64url fields.
//!
//! Tokens are not single-use and carry no expiry of their own. Callers that
//! need replay protection should put freshness fields (issued-at, expiry, a
//! one-time id) in the payload and check them after decoding.

mod crypto;
mod error;
mod format;
pub mod url;

pub use crate::crypto::{AeadBlob, KEY_LEN, KdfParams, NONCE_LEN, SALT_LEN, TAG_LEN};
pub use crate::crypto::{decrypt, derive_key, encrypt};
pub use crate::error::TokenError;
pub use crate::format::{CURRENT_VERSION, version_of};
use serde::{Serialize, de::DeserializeOwned};

/// Ordered key/value payload. Keys keep their insertion order.
pub type Payload = serde_json::Map<String, serde_json::Value>;

pub fn encode<T: Serialize + ?Sized>(payload: &T, passphrase: &str) -> Result<String, TokenError> {
    encode_with_kdf(payload, passphrase, KdfParams::default())
}

/// Seals `payload` into a token using explicit scrypt parameters.
///
/// The plaintext is compact JSON in field order, so identical input always
/// produces identical plaintext bytes.
pub fn encode_with_kdf<T: Serialize + ?Sized>(
    payload: &T,
    passphrase: &str,
    kdf: KdfParams,
) -> Result<String, TokenError> {
    if passphrase.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let plaintext =
        zeroize::Zeroizing::new(serde_json::to_vec(payload).map_err(TokenError::PayloadEncoding)?);
    let blob = crypto::encrypt(&plaintext, passphrase, kdf)?;

    Ok(format::serialize(&blob))
}

pub fn decode(token: &str, passphrase: &str) -> Result<Payload, TokenError> {
    decode_with_kdf(token, passphrase, KdfParams::default())
}

pub fn decode_with_kdf(
    token: &str,
    passphrase: &str,
    kdf: KdfParams,
) -> Result<Payload, TokenError> {
    decode_as(token, passphrase, kdf)
}

/// Opens a token and deserializes its payload into `T`.
///
/// # Errors
///
/// Format problems are reported before any key derivation happens, so a
/// foreign or unknown-version token fails cheaply.
pub fn decode_as<T: DeserializeOwned>(
    token: &str,
    passphrase: &str,
    kdf: KdfParams,
) -> Result<T, TokenError> {
    let blob = format::parse(token)?;
    let plaintext = crypto::decrypt(&blob, passphrase, kdf)?;

    serde_json::from_slice(&plaintext).map_err(TokenError::PayloadDecoding)
}
