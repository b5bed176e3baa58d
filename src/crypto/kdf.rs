use scrypt::Params;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN};
use crate::error::TokenError;

/// Upper bound on the scrypt working buffer (`128 * r * n` bytes), 1 GiB.
pub const MAX_MEMORY_BYTES: u64 = 1 << 30;

/// scrypt cost parameters.
///
/// The same parameters must be used to derive the key for encryption and
/// for decryption; a mismatch surfaces as an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    n: u32,
    r: u32,
    p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // CPU/memory cost, 16 MiB with r = 8
            n: 1 << 14,
            // block size
            r: 8,
            // parallelism
            p: 1,
        }
    }
}

impl KdfParams {
    pub fn new(n: u32, r: u32, p: u32) -> Result<Self, TokenError> {
        let params = Self { n, r, p };
        params.validate()?;
        Ok(params)
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    /// `log2(n)`, the form the scrypt implementation expects.
    pub fn log_n(&self) -> u8 {
        // n is a validated power of two below 2^32
        self.n.trailing_zeros() as u8
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(TokenError::InvalidKdfParams(format!(
                "n must be a power of two >= 2, got {}",
                self.n
            )));
        }
        if self.r < 1 {
            return Err(TokenError::InvalidKdfParams("r must be >= 1".into()));
        }
        if self.p < 1 {
            return Err(TokenError::InvalidKdfParams("p must be >= 1".into()));
        }
        let memory = 128u64
            .saturating_mul(u64::from(self.r))
            .saturating_mul(u64::from(self.n));
        if memory > MAX_MEMORY_BYTES {
            return Err(TokenError::InvalidKdfParams(format!(
                "n = {} with r = {} needs {memory} bytes, limit is {MAX_MEMORY_BYTES}",
                self.n, self.r
            )));
        }
        Ok(())
    }

    fn to_scrypt(self) -> Result<Params, TokenError> {
        self.validate()?;
        Params::new(self.log_n(), self.r, self.p, KEY_LEN)
            .map_err(|e| TokenError::InvalidKdfParams(e.to_string()))
    }
}

/// Derive a 256-bit key from a passphrase and salt.
///
/// The passphrase is checked before any derivation work is done.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8; SALT_LEN],
    kdf: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, TokenError> {
    if passphrase.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let params = kdf.to_scrypt()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase.as_bytes(), salt, &params, &mut key[..])
        .map_err(|e| TokenError::InvalidKdfParams(format!("scrypt key derivation failed: {e}")))?;

    Ok(key)
}
