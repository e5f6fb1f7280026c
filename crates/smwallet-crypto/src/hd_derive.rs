//! Deterministic Ed25519 account derivation.
//!
//! Ed25519 has no public-key child derivation, so every account is a
//! fresh keypair whose 32-byte secret seed is a keyed hash of the
//! master's secret seed and the account index.
//!
//! # Wallet format version 1
//!
//! 1. Master: the first 32 bytes of the BIP39 seed are the master
//!    Ed25519 secret seed.
//! 2. Account `i`:
//!    `I = HMAC-SHA512(key = master_seed, data = "smwallet account v1" || 0x00 || ser32_be(i | 0x80000000))`,
//!    and `I[0..32]` is the account's Ed25519 secret seed.
//!
//! Each account depends only on `(master, i)`, so indices may be
//! derived in any order. Changing the label or layout above changes
//! every account and needs a new format version.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use smwallet_types::config::{WalletConfig, MAX_ACCOUNT_LIMIT};
use smwallet_types::{Address, Result, WalletError};
use zeroize::Zeroizing;

use crate::address::pubkey_to_address;
use crate::mnemonic::Seed;
use crate::signing::{Keypair, PublicKey, Signature};

type HmacSha512 = Hmac<Sha512>;

/// Bit set on every account index before hashing.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Domain label for account derivation, wallet format version 1.
const ACCOUNT_DOMAIN: &[u8] = b"smwallet account v1";

/// Length of the seed prefix used as the master secret seed.
pub const MASTER_SEED_LEN: usize = 32;

// ---------------------------------------------------------------------------
// MasterKeyPair
// ---------------------------------------------------------------------------

/// The root keypair of a wallet. Never persisted.
pub struct MasterKeyPair {
    keypair: Keypair,
}

impl MasterKeyPair {
    /// Returns the master public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }
}

// ---------------------------------------------------------------------------
// AccountKeyPair
// ---------------------------------------------------------------------------

/// A derived account: an Ed25519 keypair plus its 0-based index.
pub struct AccountKeyPair {
    index: u32,
    keypair: Keypair,
}

impl AccountKeyPair {
    /// Rebuilds an account from its stored 64-byte `seed || public key`.
    ///
    /// # Errors
    ///
    /// [`WalletError::CryptoError`] if the public half does not match
    /// the seed.
    pub fn from_keypair_bytes(index: u32, bytes: &[u8; 64]) -> Result<Self> {
        Ok(Self {
            index,
            keypair: Keypair::from_keypair_bytes(bytes)?,
        })
    }

    /// Derivation index of this account.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Account public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Canonical account address.
    pub fn address(&self) -> Address {
        pubkey_to_address(&self.keypair.public_key())
    }

    /// Signs `message` with the account key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.keypair.sign(message)
    }

    /// 64-byte `seed || public key` encoding of the private key.
    pub fn to_keypair_bytes(&self) -> Zeroizing<[u8; 64]> {
        self.keypair.to_keypair_bytes()
    }
}

impl PartialEq for AccountKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && *self.to_keypair_bytes() == *other.to_keypair_bytes()
    }
}

impl Eq for AccountKeyPair {}

impl fmt::Debug for AccountKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKeyPair")
            .field("index", &self.index)
            .field("public_key", &self.public_key().to_string())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// KeyTree
// ---------------------------------------------------------------------------

/// Account derivation bounded by a per-wallet account limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyTree {
    max_accounts: u32,
}

impl KeyTree {
    /// Creates a tree allowing indices `0..max_accounts`.
    ///
    /// # Errors
    ///
    /// [`WalletError::ConfigError`] if `max_accounts` exceeds 2^31.
    pub fn new(max_accounts: u32) -> Result<Self> {
        if max_accounts > MAX_ACCOUNT_LIMIT {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "max_accounts must not exceed {MAX_ACCOUNT_LIMIT}, got {max_accounts}"
                ),
            });
        }
        Ok(Self { max_accounts })
    }

    /// Creates a tree from the account limit in `config`.
    pub fn from_config(config: &WalletConfig) -> Result<Self> {
        Self::new(config.max_accounts_per_wallet)
    }

    /// The configured account limit.
    pub fn max_accounts(&self) -> u32 {
        self.max_accounts
    }

    /// Derives `n` accounts (indices `0..n`) from a BIP39 seed.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] if `n > max_accounts`.
    pub fn derive_accounts(&self, seed: &Seed, n: u32) -> Result<Vec<AccountKeyPair>> {
        if n > self.max_accounts {
            return Err(WalletError::AccountLimitExceeded {
                requested: n,
                max: self.max_accounts,
            });
        }

        let master = master_from_seed(&seed.as_bytes()[..MASTER_SEED_LEN])?;
        let accounts = (0..n)
            .map(|index| self.derive_child(&master, index))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(accounts = n, "derived wallet accounts");
        Ok(accounts)
    }

    /// Derives the account at `index` from `master`.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] if `index >= max_accounts`.
    pub fn derive_child(&self, master: &MasterKeyPair, index: u32) -> Result<AccountKeyPair> {
        if index >= self.max_accounts {
            return Err(WalletError::AccountLimitExceeded {
                requested: index,
                max: self.max_accounts,
            });
        }

        let master_seed = master.keypair.seed_bytes();
        let account_seed = child_seed(&master_seed, index)?;

        Ok(AccountKeyPair {
            index,
            keypair: Keypair::from_seed(&account_seed),
        })
    }
}

// ---------------------------------------------------------------------------
// Master key
// ---------------------------------------------------------------------------

/// Builds the master keypair from exactly [`MASTER_SEED_LEN`] seed bytes.
///
/// # Errors
///
/// [`WalletError::InvalidSeedLength`] for any other length.
pub fn master_from_seed(seed_prefix: &[u8]) -> Result<MasterKeyPair> {
    let bytes: &[u8; MASTER_SEED_LEN] =
        seed_prefix
            .try_into()
            .map_err(|_| WalletError::InvalidSeedLength {
                expected: MASTER_SEED_LEN,
                actual: seed_prefix.len(),
            })?;
    Ok(MasterKeyPair {
        keypair: Keypair::from_seed(bytes),
    })
}

// ---------------------------------------------------------------------------
// Internal: child seed
// ---------------------------------------------------------------------------

fn child_seed(master_seed: &[u8; 32], index: u32) -> Result<Zeroizing<[u8; 32]>> {
    let mut mac = HmacSha512::new_from_slice(master_seed).map_err(|e| WalletError::CryptoError {
        reason: format!("HMAC-SHA512 key init failed: {e}"),
    })?;
    mac.update(ACCOUNT_DOMAIN);
    mac.update(&[0x00]);
    mac.update(&(index | HARDENED_OFFSET).to_be_bytes());

    let mut digest = Zeroizing::new([0u8; 64]);
    digest.copy_from_slice(&mac.finalize().into_bytes());
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&digest[..32]);
    Ok(seed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
