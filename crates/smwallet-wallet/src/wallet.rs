//! The in-memory wallet aggregate.
//!
//! A [`Wallet`] combines cleartext [`WalletMetadata`] with the secret
//! half, [`WalletSecrets`]: the mnemonic and the accounts derived from
//! it. A wallet is either fully valid or not constructed at all; every
//! constructor checks the account-count invariant against the
//! [`WalletConfig`] it is given.
//!
//! Accounts are never rotated in place. [`Wallet::add_account`]
//! re-derives from the stored mnemonic at the next unused index.

use std::fmt;

use serde::{Deserialize, Serialize};
use smwallet_crypto::hd_derive::{master_from_seed, AccountKeyPair, KeyTree, MASTER_SEED_LEN};
use smwallet_crypto::mnemonic::{generate_mnemonic, Mnemonic};
use smwallet_types::config::{WalletConfig, MAX_ACCOUNT_LIMIT};
use smwallet_types::{Result, Timestamp, WalletError};

/// BIP39 passphrase used for every wallet seed.
const SEED_PASSPHRASE: &str = "";

// ---------------------------------------------------------------------------
// WalletMetadata
// ---------------------------------------------------------------------------

/// Cleartext wallet metadata.
///
/// `created` is fixed at construction and has no setter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WalletMetadata {
    #[serde(rename = "displayName")]
    display_name: String,
    created: Timestamp,
    /// Empty means the network is unset.
    #[serde(rename = "genesisID", default)]
    genesis_id: String,
}

impl WalletMetadata {
    /// Metadata stamped with the current time and no genesis identifier.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_created(display_name, Timestamp::now())
    }

    /// Metadata with an explicit creation time.
    pub fn with_created(display_name: impl Into<String>, created: Timestamp) -> Self {
        Self {
            display_name: display_name.into(),
            created,
            genesis_id: String::new(),
        }
    }

    /// User-facing wallet name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Creation time.
    pub fn created(&self) -> Timestamp {
        self.created
    }

    /// Genesis / network identifier, empty when unset.
    pub fn genesis_id(&self) -> &str {
        &self.genesis_id
    }
}

// ---------------------------------------------------------------------------
// WalletSecrets
// ---------------------------------------------------------------------------

/// Mnemonic plus the ordered accounts derived from it.
///
/// Account `i` always sits at position `i`.
pub struct WalletSecrets {
    mnemonic: Mnemonic,
    accounts: Vec<AccountKeyPair>,
}

impl WalletSecrets {
    /// Bundles a mnemonic with accounts loaded from elsewhere.
    ///
    /// Every account is re-derived from `mnemonic` and must match.
    ///
    /// # Errors
    ///
    /// [`WalletError::MalformedContainer`] if the account indices are not
    /// exactly `0..accounts.len()` in order, or if any account is not the
    /// one the mnemonic derives at its index.
    pub fn new(mnemonic: Mnemonic, accounts: Vec<AccountKeyPair>) -> Result<Self> {
        if let Some((position, account)) = accounts
            .iter()
            .enumerate()
            .find(|(position, account)| account.index() as usize != *position)
        {
            return Err(WalletError::MalformedContainer {
                reason: format!(
                    "account at position {position} has index {}",
                    account.index()
                ),
            });
        }

        if !accounts.is_empty() {
            let tree = KeyTree::new(MAX_ACCOUNT_LIMIT)?;
            let seed = mnemonic.to_seed(SEED_PASSPHRASE)?;
            let master = master_from_seed(&seed.as_bytes()[..MASTER_SEED_LEN])?;
            for account in &accounts {
                if tree.derive_child(&master, account.index())? != *account {
                    return Err(WalletError::MalformedContainer {
                        reason: format!(
                            "account {} is not derived from the stored mnemonic",
                            account.index()
                        ),
                    });
                }
            }
        }

        Ok(Self::from_derived(mnemonic, accounts))
    }

    /// Accounts just derived from `mnemonic` in index order.
    fn from_derived(mnemonic: Mnemonic, accounts: Vec<AccountKeyPair>) -> Self {
        Self { mnemonic, accounts }
    }

    /// The mnemonic phrase.
    pub fn mnemonic(&self) -> &str {
        self.mnemonic.as_str()
    }

    /// Accounts in derivation order.
    pub fn accounts(&self) -> &[AccountKeyPair] {
        &self.accounts
    }
}

impl PartialEq for WalletSecrets {
    fn eq(&self, other: &Self) -> bool {
        self.mnemonic.as_str() == other.mnemonic.as_str() && self.accounts == other.accounts
    }
}

impl Eq for WalletSecrets {}

impl fmt::Debug for WalletSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSecrets")
            .field("mnemonic", &"<redacted>")
            .field("accounts", &self.accounts)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Wallet aggregate: metadata, mnemonic and derived accounts.
#[derive(Debug, PartialEq, Eq)]
pub struct Wallet {
    meta: WalletMetadata,
    secrets: WalletSecrets,
}

impl Wallet {
    /// Creates a wallet from a freshly generated mnemonic with `n` accounts.
    ///
    /// The entropy width comes from `config.mnemonic_entropy_bits`.
    pub fn new_random(n: u32, config: &WalletConfig) -> Result<Self> {
        config.validate()?;
        let mnemonic = generate_mnemonic(config.mnemonic_entropy_bits)?;
        Self::build(mnemonic, n, config)
    }

    /// Creates a wallet from an existing mnemonic with `n` accounts.
    ///
    /// Deterministic: the same phrase and `n` always give the same
    /// accounts in the same order.
    ///
    /// # Errors
    ///
    /// - [`WalletError::InvalidMnemonic`] if the phrase fails validation.
    /// - [`WalletError::AccountLimitExceeded`] if `n` exceeds the limit.
    pub fn from_mnemonic(phrase: &str, n: u32, config: &WalletConfig) -> Result<Self> {
        config.validate()?;
        let mnemonic = Mnemonic::parse(phrase)?;
        Self::build(mnemonic, n, config)
    }

    fn build(mnemonic: Mnemonic, n: u32, config: &WalletConfig) -> Result<Self> {
        let tree = KeyTree::from_config(config)?;
        let seed = mnemonic.to_seed(SEED_PASSPHRASE)?;
        let accounts = tree.derive_accounts(&seed, n)?;
        let secrets = WalletSecrets::from_derived(mnemonic, accounts);

        tracing::info!(accounts = n, "wallet created");
        Ok(Self {
            meta: WalletMetadata::new(config.default_display_name.clone()),
            secrets,
        })
    }

    /// Reassembles a wallet from its parts, e.g. after decryption.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] if there are more accounts
    /// than `config.max_accounts_per_wallet`.
    pub fn from_parts(
        meta: WalletMetadata,
        secrets: WalletSecrets,
        config: &WalletConfig,
    ) -> Result<Self> {
        let count = secrets.accounts.len();
        if count > config.max_accounts_per_wallet as usize {
            return Err(WalletError::AccountLimitExceeded {
                requested: u32::try_from(count).unwrap_or(u32::MAX),
                max: config.max_accounts_per_wallet,
            });
        }
        Ok(Self { meta, secrets })
    }

    /// Splits the wallet into metadata and secrets.
    pub fn into_parts(self) -> (WalletMetadata, WalletSecrets) {
        (self.meta, self.secrets)
    }

    // -- Accessors --------------------------------------------------------

    /// Cleartext metadata.
    pub fn meta(&self) -> &WalletMetadata {
        &self.meta
    }

    /// Mnemonic and accounts.
    pub fn secrets(&self) -> &WalletSecrets {
        &self.secrets
    }

    /// The stored mnemonic phrase.
    pub fn mnemonic(&self) -> &str {
        self.secrets.mnemonic()
    }

    /// Accounts in derivation order.
    pub fn accounts(&self) -> &[AccountKeyPair] {
        self.secrets.accounts()
    }

    /// The account at `index`, if derived.
    pub fn account(&self, index: u32) -> Option<&AccountKeyPair> {
        self.secrets.accounts.get(index as usize)
    }

    // -- Mutation ---------------------------------------------------------

    /// Renames the wallet.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.meta.display_name = name.into();
    }

    /// Sets the genesis / network identifier. Empty unsets it.
    pub fn set_genesis_id(&mut self, id: impl Into<String>) {
        self.meta.genesis_id = id.into();
    }

    /// Derives the next account from the stored mnemonic and appends it.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] once the wallet is full.
    pub fn add_account(&mut self, config: &WalletConfig) -> Result<&AccountKeyPair> {
        let next = u32::try_from(self.secrets.accounts.len()).map_err(|_| {
            WalletError::AccountLimitExceeded {
                requested: u32::MAX,
                max: config.max_accounts_per_wallet,
            }
        })?;

        let tree = KeyTree::from_config(config)?;
        let seed = self.secrets.mnemonic.to_seed(SEED_PASSPHRASE)?;
        let master = master_from_seed(&seed.as_bytes()[..MASTER_SEED_LEN])?;
        let account = tree.derive_child(&master, next)?;

        tracing::debug!(index = next, "account added");
        self.secrets.accounts.push(account);
        let added = &self.secrets.accounts[next as usize];
        Ok(added)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
