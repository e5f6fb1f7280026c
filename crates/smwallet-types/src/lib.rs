//! Core shared types for the smwallet workspace.
//!
//! Every crate in the workspace reports failures through
//! [`WalletError`] and shares the [`Timestamp`] and [`Address`]
//! representations defined here. Tunable limits live in [`config`].

pub mod config;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Account address derived from `SHA3-256(public_key)`.
///
/// The raw 32-byte form is canonical; the Bech32 display form with an
/// embedded checksum is produced by `smwallet_crypto::address`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Address([u8; 32]);

impl Address {
    /// The fixed byte length of an address.
    pub const LEN: usize = 32;

    /// Creates a new `Address` from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| WalletError::MalformedHex {
            reason: format!("address: {e}"),
        })?;
        if bytes.len() != Self::LEN {
            return Err(WalletError::MalformedHex {
                reason: format!("address must be {} bytes, got {}", Self::LEN, bytes.len()),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// UTC timestamp with whole-second precision.
///
/// Rendered as RFC 3339 / ISO 8601 with a `Z` suffix, e.g.
/// `2024-01-01T00:00:00Z`. Sub-second precision is dropped at
/// construction so that a timestamp always survives a text round trip
/// unchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(0))
    }

    /// Creates a `Timestamp` from a `DateTime<Utc>`, truncated to seconds.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(0))
    }

    /// Returns the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the timestamp as an ISO 8601 string.
    pub fn as_str(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl FromStr for Timestamp {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| WalletError::MalformedContainer {
                reason: format!("invalid ISO 8601 timestamp '{s}': {e}"),
            })?
            .with_timezone(&Utc);
        Ok(Self::from_datetime(dt))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// WalletError
// ---------------------------------------------------------------------------

/// Central error type for the smwallet workspace.
///
/// Derivation and codec functions are pure: none of them retry, and
/// the same inputs always fail with the same variant. The only error a
/// caller should react to by retrying is [`WalletError::DecryptionFailed`]
/// (prompt for the password again).
#[derive(Debug, Error)]
pub enum WalletError {
    /// The requested mnemonic entropy width is not supported by BIP39.
    #[error("invalid entropy size: {bits} bits (expected 128, 160, 192, 224 or 256)")]
    InvalidEntropySize {
        /// The rejected entropy width in bits.
        bits: usize,
    },

    /// The mnemonic has a bad word count, an unknown word, or a bad checksum.
    #[error("invalid mnemonic: {reason}")]
    InvalidMnemonic {
        /// Human-readable description of the failed check.
        reason: String,
    },

    /// Seed material handed to the derivation tree has the wrong length.
    #[error("invalid seed length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// An account index or account count is outside `[0, max]`.
    #[error("account limit exceeded: {requested} is outside the allowed range (max {max})")]
    AccountLimitExceeded {
        /// The rejected index or count.
        requested: u32,
        /// The configured maximum number of accounts per wallet.
        max: u32,
    },

    /// Wrong password or corrupted container.
    ///
    /// Intentionally carries no detail so that callers cannot tell a
    /// key mismatch from an authentication or parse failure.
    #[error("decryption failed: wrong password or corrupted wallet")]
    DecryptionFailed,

    /// A hex-encoded field has odd length, invalid characters, or the
    /// wrong decoded width.
    #[error("malformed hex: {reason}")]
    MalformedHex {
        /// Human-readable description of the encoding problem.
        reason: String,
    },

    /// The container text is not structurally valid.
    #[error("malformed container: {reason}")]
    MalformedContainer {
        /// Human-readable description of the structural problem.
        reason: String,
    },

    /// A cipher, KDF, or hash identifier is not implemented.
    #[error("unsupported {kind} algorithm: '{name}'")]
    UnsupportedAlgorithm {
        /// Which parameter carried the identifier (`cipher`, `kdf`, `hash`).
        kind: &'static str,
        /// The identifier as it appeared in the input.
        name: String,
    },

    /// A display-form address failed Bech32 decoding or its checksum.
    #[error("invalid address: {reason}")]
    InvalidAddress {
        /// Human-readable description of the address problem.
        reason: String,
    },

    /// A cryptographic primitive failed (entropy source, signing, encryption).
    #[error("crypto error: {reason}")]
    CryptoError {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// Reading or writing a wallet file failed.
    #[error("storage error: {reason}")]
    StorageError {
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`WalletError`].
pub type Result<T> = std::result::Result<T, WalletError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
