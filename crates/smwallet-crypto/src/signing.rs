//! Ed25519 digital signature operations.
//!
//! The private key is zeroized on drop via `ed25519-dalek`'s built-in
//! `ZeroizeOnDrop`. Secret bytes handed out by [`Keypair`] are wrapped
//! in [`Zeroizing`] so copies are wiped as well.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use smwallet_types::{Result, WalletError};
use zeroize::Zeroizing;

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// Ed25519 public key (32 bytes).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Fixed byte length of an Ed25519 public key.
    pub const LEN: usize = 32;

    /// Creates a [`PublicKey`] from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying 32-byte array.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Ed25519 signature (64 bytes).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Fixed byte length of an Ed25519 signature.
    pub const LEN: usize = 64;

    /// Creates a [`Signature`] from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying 64-byte array.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// Ed25519 signing keypair.
///
/// Wraps an `ed25519-dalek` [`SigningKey`], which wipes itself on drop.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fixed byte length of the secret seed.
    pub const SEED_LEN: usize = 32;

    /// Fixed byte length of the `seed || public key` encoding.
    pub const KEYPAIR_LEN: usize = 64;

    /// Reconstructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstructs a keypair from its 64-byte `seed || public key` form.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::CryptoError`] if the public half does not
    /// belong to the seed.
    pub fn from_keypair_bytes(bytes: &[u8; 64]) -> Result<Self> {
        let signing_key =
            SigningKey::from_keypair_bytes(bytes).map_err(|e| WalletError::CryptoError {
                reason: format!("inconsistent Ed25519 keypair: {e}"),
            })?;
        Ok(Self { signing_key })
    }

    /// Returns the public half of this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Signs `message`. Deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Returns a wiped-on-drop copy of the 32-byte secret seed.
    pub fn seed_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Returns a wiped-on-drop copy of the 64-byte `seed || public key`
    /// encoding.
    pub fn to_keypair_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }
}

// Keypair intentionally does not implement Clone or Debug.

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies an Ed25519 signature with strict (non-malleable) checks.
///
/// Returns [`WalletError::CryptoError`] if the key is invalid or the
/// signature does not verify.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> Result<()> {
    let vk = VerifyingKey::from_bytes(&public_key.0).map_err(|e| WalletError::CryptoError {
        reason: format!("invalid public key: {e}"),
    })?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify_strict(message, &sig)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("signature verification failed: {e}"),
        })
}
