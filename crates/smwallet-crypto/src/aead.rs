//! XChaCha20-Poly1305 authenticated encryption with associated data.
//!
//! Wallet secrets are sealed with XChaCha20-Poly1305 under a 192-bit
//! (24-byte) nonce drawn fresh for every encryption. A failed open is
//! reported as the single coarse [`WalletError::DecryptionFailed`].

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use smwallet_types::{Result, WalletError};
use zeroize::Zeroizing;

/// Canonical cipher identifier.
pub const CIPHER_NAME: &str = "XChaCha20-Poly1305";

/// Poly1305 tag length appended to every ciphertext.
pub const TAG_LEN: usize = 16;

// ---------------------------------------------------------------------------
// AeadNonce
// ---------------------------------------------------------------------------

/// 192-bit (24-byte) nonce for XChaCha20-Poly1305.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AeadNonce([u8; 24]);

impl AeadNonce {
    /// Fixed byte length of an XChaCha20-Poly1305 nonce.
    pub const LEN: usize = 24;

    /// Creates an [`AeadNonce`] from raw bytes.
    pub fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying 24-byte array.
    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

/// Generates a fresh random nonce from OS entropy.
pub fn generate_aead_nonce() -> Result<AeadNonce> {
    generate_aead_nonce_with(&mut OsRng)
}

/// Generates a nonce from a caller-supplied CSPRNG.
pub fn generate_aead_nonce_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<AeadNonce> {
    let mut bytes = [0u8; 24];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("entropy source failed: {e}"),
        })?;
    Ok(AeadNonce(bytes))
}

// ---------------------------------------------------------------------------
// Seal / Open
// ---------------------------------------------------------------------------

/// Encrypts `plaintext`, returning ciphertext with the 16-byte tag
/// appended. `aad` is authenticated but not encrypted.
pub fn encrypt_xchacha20(
    key: &[u8; 32],
    nonce: &AeadNonce,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    cipher
        .encrypt(XNonce::from_slice(&nonce.0), payload)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("XChaCha20-Poly1305 encryption failed: {e}"),
        })
}

/// Decrypts and authenticates `ciphertext`.
///
/// # Errors
///
/// Returns [`WalletError::DecryptionFailed`] on any tag mismatch
/// (wrong key, wrong nonce, tampered ciphertext, or wrong AAD).
pub fn decrypt_xchacha20(
    key: &[u8; 32],
    nonce: &AeadNonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(XNonce::from_slice(&nonce.0), payload)
        .map(Zeroizing::new)
        .map_err(|_| WalletError::DecryptionFailed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
