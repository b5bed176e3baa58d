//! Cryptographic primitives for token sealing.
//!
//! Provides passphrase key derivation and authenticated encryption.

pub mod aead;
pub mod kdf;

pub use aead::{AeadBlob, decrypt, encrypt};
pub use kdf::{KdfParams, derive_key};

/// Length of the KDF salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for AES-256-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;
