// ABOUTME: Credential vault encrypting datasource connection fields at rest
// ABOUTME: AES-256-CBC with a scrypt-derived key and hex(iv):hex(ciphertext) tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Credential vault
//!
//! Tokens have the form `hex(iv):hex(ciphertext)` with a fresh 16-byte IV per
//! call. The key is derived once from the process secret with scrypt
//! (N=2^14, r=8, p=1, salt `"salt"`) so tokens written by earlier deployments
//! keep decrypting.
//!
//! CBC carries no integrity tag: a tampered token either fails padding or
//! decrypts to garbage. Callers that need tamper detection must add it on top.

use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::constants::vault;
use crate::errors::{AppError, AppResult};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

static SHARED_VAULT: OnceLock<CredentialVault> = OnceLock::new();

/// Symmetric vault for datasource credentials
///
/// Cloning is cheap; all clones share the same zeroizing key buffer.
#[derive(Clone)]
pub struct CredentialVault {
    key: Arc<Zeroizing<[u8; vault::KEY_LEN]>>,
}

impl Debug for CredentialVault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialVault {
    /// Derive the vault key from a process secret
    ///
    /// # Errors
    ///
    /// Returns a config error if the secret is empty or key derivation fails
    pub fn from_secret(secret: &str) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::config("Encryption secret must not be empty"));
        }

        let params = scrypt::Params::new(
            vault::SCRYPT_LOG_N,
            vault::SCRYPT_R,
            vault::SCRYPT_P,
            vault::KEY_LEN,
        )
        .map_err(|e| AppError::config(format!("Invalid scrypt parameters: {e}")))?;

        let mut key = Zeroizing::new([0u8; vault::KEY_LEN]);
        scrypt::scrypt(secret.as_bytes(), vault::KEY_SALT, &params, &mut key[..])
            .map_err(|e| AppError::config(format!("Key derivation failed: {e}")))?;

        debug!("Credential vault key derived");
        Ok(Self { key: Arc::new(key) })
    }

    /// Encrypt a plaintext field into a `hex(iv):hex(ciphertext)` token
    ///
    /// The empty string encrypts to the empty string.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the cipher cannot be initialized
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut iv = [0u8; vault::IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(&self.key[..], &iv)
            .map_err(|e| AppError::internal(format!("Cipher initialization failed: {e}")))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(format!(
            "{}{}{}",
            hex::encode(iv),
            vault::TOKEN_SEPARATOR,
            hex::encode(ciphertext)
        ))
    }

    /// Decrypt a token produced by [`CredentialVault::encrypt`]
    ///
    /// The empty string decrypts to the empty string.
    ///
    /// # Errors
    ///
    /// Returns a decode error for a missing separator, invalid hex, a wrong IV
    /// length, bad padding, or plaintext that is not UTF-8. The token itself
    /// is never included in the message.
    pub fn decrypt(&self, token: &str) -> AppResult<String> {
        if token.is_empty() {
            return Ok(String::new());
        }

        let (iv_hex, ct_hex) = token
            .split_once(vault::TOKEN_SEPARATOR)
            .ok_or_else(|| AppError::decode("Encrypted value is missing the IV separator"))?;

        let iv = hex::decode(iv_hex)
            .map_err(|e| AppError::decode("Encrypted value has an invalid IV").with_source(e))?;
        if iv.len() != vault::IV_LEN {
            return Err(AppError::decode(format!(
                "Encrypted value IV must be {} bytes, got {}",
                vault::IV_LEN,
                iv.len()
            )));
        }
        let ciphertext = hex::decode(ct_hex).map_err(|e| {
            AppError::decode("Encrypted value has invalid ciphertext").with_source(e)
        })?;

        let cipher = Aes256CbcDec::new_from_slices(&self.key[..], &iv)
            .map_err(|e| AppError::decode(format!("Cipher initialization failed: {e}")))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| AppError::decode("Encrypted value could not be decrypted"))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::decode("Decrypted value is not valid UTF-8").with_source(e))
    }
}

/// Process-wide vault, derived on first use
///
/// Later calls return the first instance regardless of `secret`.
///
/// # Errors
///
/// Returns an error if the first derivation fails
pub fn shared_vault(secret: &str) -> AppResult<CredentialVault> {
    if let Some(existing) = SHARED_VAULT.get() {
        return Ok(existing.clone());
    }
    let vault = CredentialVault::from_secret(secret)?;
    // A concurrent caller may have initialized it first
    Ok(SHARED_VAULT.get_or_init(|| vault).clone())
}
