//! Account addresses.
//!
//! The canonical address is `SHA3-256(public_key)`. For display the
//! 32-byte hash is followed by a 4-byte checksum
//! (`SHA3-256(hash)[0..4]`) and Bech32-encoded under the `sm` prefix,
//! so a mistyped address is caught twice: once by Bech32 and once by
//! the embedded checksum.

use bech32::{self, FromBase32, ToBase32, Variant};
use sha3::{Digest, Sha3_256};
use smwallet_types::{Address, Result, WalletError};

use crate::signing::PublicKey;

/// Human-readable prefix for Bech32-encoded addresses.
pub const BECH32_HRP: &str = "sm";

const CHECKSUM_LEN: usize = 4;
const PAYLOAD_LEN: usize = Address::LEN + CHECKSUM_LEN;

/// Computes the SHA3-256 hash of arbitrary data.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Derives the canonical [`Address`] for a public key.
pub fn pubkey_to_address(public_key: &PublicKey) -> Address {
    Address::new(sha3_256(public_key.as_bytes()))
}

fn checksum(hash: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha3_256(hash);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Encodes an address as `sm1…` Bech32 with the embedded checksum.
pub fn to_bech32(address: &Address) -> Result<String> {
    let mut payload = [0u8; PAYLOAD_LEN];
    payload[..Address::LEN].copy_from_slice(address.as_bytes());
    payload[Address::LEN..].copy_from_slice(&checksum(address.as_bytes()));

    bech32::encode(BECH32_HRP, payload.to_base32(), Variant::Bech32).map_err(|e| {
        WalletError::CryptoError {
            reason: format!("bech32 encoding failed: {e}"),
        }
    })
}

/// Decodes an `sm1…` string back into an [`Address`].
///
/// # Errors
///
/// Returns [`WalletError::InvalidAddress`] on a Bech32 error, a wrong
/// prefix, a wrong payload length, or a checksum mismatch.
pub fn from_bech32(s: &str) -> Result<Address> {
    let (hrp, data, variant) = bech32::decode(s).map_err(|e| WalletError::InvalidAddress {
        reason: format!("bech32 decoding failed: {e}"),
    })?;

    if hrp != BECH32_HRP {
        return Err(WalletError::InvalidAddress {
            reason: format!("expected prefix '{BECH32_HRP}', got '{hrp}'"),
        });
    }
    if variant != Variant::Bech32 {
        return Err(WalletError::InvalidAddress {
            reason: "expected Bech32, got Bech32m".into(),
        });
    }

    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| WalletError::InvalidAddress {
        reason: format!("bech32 base32 conversion failed: {e}"),
    })?;
    if bytes.len() != PAYLOAD_LEN {
        return Err(WalletError::InvalidAddress {
            reason: format!("expected {PAYLOAD_LEN} bytes, got {}", bytes.len()),
        });
    }

    let (hash, provided) = bytes.split_at(Address::LEN);
    if provided != checksum(hash) {
        return Err(WalletError::InvalidAddress {
            reason: "checksum mismatch".into(),
        });
    }

    let mut arr = [0u8; 32];
    arr.copy_from_slice(hash);
    Ok(Address::new(arr))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
