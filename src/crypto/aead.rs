use super::{KEY_LEN, NONCE_LEN, SALT_LEN, kdf::KdfParams, kdf::derive_key};
use crate::error::TokenError;
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

/// Salt, nonce and ciphertext (with tag) produced by one encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadBlob {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl AeadBlob {
    pub fn new(salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            salt,
            nonce,
            ciphertext,
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), TokenError> {
    fill(buf).map_err(|_| TokenError::RandomUnavailable)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN], TokenError> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate nonce
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], TokenError> {
    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;
    Ok(nonce)
}

fn cipher(key: &[u8; KEY_LEN]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Encrypt plaintext under a key derived from `passphrase`.
///
/// Salt and nonce are drawn fresh on every call, so a (key, nonce) pair is
/// never reused.
pub fn encrypt(plaintext: &[u8], passphrase: &str, kdf: KdfParams) -> Result<AeadBlob, TokenError> {
    let salt = generate_salt()?;
    let key = derive_key(passphrase, &salt, kdf)?;

    let nonce = generate_nonce()?;
    let ciphertext = cipher(&key)
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| TokenError::EncryptionFailed)?;

    Ok(AeadBlob::new(salt, nonce, ciphertext))
}

/// Decrypt and authenticate a blob.
///
/// Every tag mismatch maps to [`TokenError::AuthenticationFailed`].
pub fn decrypt(
    blob: &AeadBlob,
    passphrase: &str,
    kdf: KdfParams,
) -> Result<Zeroizing<Vec<u8>>, TokenError> {
    let key = derive_key(passphrase, blob.salt(), kdf)?;

    let plaintext = cipher(&key)
        .decrypt(Nonce::from_slice(blob.nonce()), blob.ciphertext())
        .map_err(|_| TokenError::AuthenticationFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TAG_LEN;

    fn cheap() -> KdfParams {
        KdfParams::new(16, 8, 1).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let blob = encrypt(b"secret data", "pw", cheap()).unwrap();
        let plaintext = decrypt(&blob, "pw", cheap()).unwrap();

        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn ciphertext_carries_tag() {
        let blob = encrypt(b"12345", "pw", cheap()).unwrap();
        assert_eq!(blob.ciphertext().len(), 5 + TAG_LEN);

        let empty = encrypt(b"", "pw", cheap()).unwrap();
        assert_eq!(empty.ciphertext().len(), TAG_LEN);
    }

    #[test]
    fn salt_and_nonce_are_fresh() {
        let a = encrypt(b"same", "pw", cheap()).unwrap();
        let b = encrypt(b"same", "pw", cheap()).unwrap();

        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn wrong_password_fails() {
        let blob = encrypt(b"secret", "correct", cheap()).unwrap();
        assert!(matches!(
            decrypt(&blob, "wrong", cheap()),
            Err(TokenError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_params_fail_authentication() {
        let blob = encrypt(b"secret", "pw", cheap()).unwrap();
        let other = KdfParams::new(32, 8, 1).unwrap();
        assert!(matches!(
            decrypt(&blob, "pw", other),
            Err(TokenError::AuthenticationFailed)
        ));
    }

    #[test]
    fn altered_fields_fail_authentication() {
        let blob = encrypt(b"secret", "pw", cheap()).unwrap();

        let mut salt = *blob.salt();
        salt[0] ^= 0x01;
        let bad_salt = AeadBlob::new(salt, *blob.nonce(), blob.ciphertext().to_vec());

        let mut nonce = *blob.nonce();
        nonce[11] ^= 0x80;
        let bad_nonce = AeadBlob::new(*blob.salt(), nonce, blob.ciphertext().to_vec());

        let mut ct = blob.ciphertext().to_vec();
        let last = ct.len() - 1;
        ct[last] ^= 0xff;
        let bad_ct = AeadBlob::new(*blob.salt(), *blob.nonce(), ct);

        for tampered in [bad_salt, bad_nonce, bad_ct] {
            assert!(matches!(
                decrypt(&tampered, "pw", cheap()),
                Err(TokenError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn empty_passphrase_is_missing_secret() {
        assert!(matches!(
            encrypt(b"x", "", cheap()),
            Err(TokenError::MissingSecret)
        ));

        let blob = encrypt(b"x", "pw", cheap()).unwrap();
        assert!(matches!(
            decrypt(&blob, "", cheap()),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn truncated_ciphertext_fails_authentication() {
        let blob = AeadBlob::new([0u8; SALT_LEN], [0u8; NONCE_LEN], vec![1, 2, 3]);
        assert!(matches!(
            decrypt(&blob, "pw", cheap()),
            Err(TokenError::AuthenticationFailed)
        ));
    }
}
