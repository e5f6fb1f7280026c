//! Lock / unlock lifecycle over a sealed container.
//!
//! A [`WalletSession`] always holds the sealed [`EncryptedContainer`].
//! While [`SessionState::Unlocked`] it also holds the opened
//! [`Wallet`]; locking drops it, and the mnemonic and signing keys
//! are zeroized with it.
//!
//! The session's [`WalletConfig`] governs every seal and unlock: its
//! iteration count goes into new containers and its account limit is
//! enforced before anything is written.

use smwallet_crypto::hd_derive::AccountKeyPair;
use smwallet_crypto::kdf::Pbkdf2Params;
use smwallet_types::config::WalletConfig;
use smwallet_types::{Result, WalletError};

use crate::container::{decrypt_wallet, encrypt_wallet, EncryptedContainer};
use crate::wallet::Wallet;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether the secrets are in memory.
pub enum SessionState {
    /// Only the sealed container is held.
    Locked,
    /// The container has been opened.
    Unlocked(Wallet),
}

// ---------------------------------------------------------------------------
// WalletSession
// ---------------------------------------------------------------------------

/// A sealed container plus, optionally, its opened wallet.
pub struct WalletSession {
    container: EncryptedContainer,
    config: WalletConfig,
    state: SessionState,
}

impl WalletSession {
    /// Starts a locked session over `container`.
    pub fn new(container: EncryptedContainer, config: WalletConfig) -> Self {
        Self {
            container,
            config,
            state: SessionState::Locked,
        }
    }

    /// Seals `wallet` under `password` and starts an unlocked session.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] if `wallet` holds more
    /// accounts than `config` allows.
    pub fn from_wallet(wallet: Wallet, password: &str, config: WalletConfig) -> Result<Self> {
        let container = seal(&wallet, password, &config)?;
        Ok(Self {
            container,
            config,
            state: SessionState::Unlocked(wallet),
        })
    }

    /// Opens the container with `password`.
    ///
    /// No-op if already unlocked. On failure the session stays locked.
    ///
    /// # Errors
    ///
    /// [`WalletError::DecryptionFailed`] for a wrong password or a
    /// damaged container.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        if self.is_unlocked() {
            return Ok(());
        }

        match decrypt_wallet(&self.container, password, &self.config) {
            Ok(wallet) => {
                self.state = SessionState::Unlocked(wallet);
                tracing::info!("wallet unlocked");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet unlock failed");
                Err(e)
            }
        }
    }

    /// Drops the opened wallet. No-op if already locked.
    pub fn lock(&mut self) {
        self.state = SessionState::Locked;
    }

    /// Whether the wallet is currently open.
    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, SessionState::Unlocked(_))
    }

    /// The opened wallet.
    ///
    /// # Errors
    ///
    /// [`WalletError::CryptoError`] while locked.
    pub fn wallet(&self) -> Result<&Wallet> {
        match &self.state {
            SessionState::Unlocked(wallet) => Ok(wallet),
            SessionState::Locked => Err(locked_error()),
        }
    }

    /// Mutable access to the opened wallet. Changes are not persisted
    /// until [`reseal`](Self::reseal) is called.
    pub fn wallet_mut(&mut self) -> Result<&mut Wallet> {
        match &mut self.state {
            SessionState::Unlocked(wallet) => Ok(wallet),
            SessionState::Locked => Err(locked_error()),
        }
    }

    /// Derives the next account under the session's account limit.
    /// Not persisted until [`reseal`](Self::reseal) is called.
    pub fn add_account(&mut self) -> Result<&AccountKeyPair> {
        match &mut self.state {
            SessionState::Unlocked(wallet) => wallet.add_account(&self.config),
            SessionState::Locked => Err(locked_error()),
        }
    }

    /// Re-encrypts the opened wallet, replacing the held container.
    ///
    /// Also used to change the password. Fresh salt and IV are drawn
    /// and the iteration count is taken from the session config.
    ///
    /// # Errors
    ///
    /// [`WalletError::AccountLimitExceeded`] if the wallet has grown past
    /// the session's limit; the held container is left unchanged.
    pub fn reseal(&mut self, password: &str) -> Result<()> {
        let container = match &self.state {
            SessionState::Unlocked(wallet) => seal(wallet, password, &self.config)?,
            SessionState::Locked => return Err(locked_error()),
        };
        self.container = container;
        tracing::debug!("wallet resealed");
        Ok(())
    }

    /// The sealed container as of the last seal.
    pub fn container(&self) -> &EncryptedContainer {
        &self.container
    }

    /// Consumes the session, keeping only the sealed container.
    pub fn into_container(self) -> EncryptedContainer {
        self.container
    }
}

fn seal(wallet: &Wallet, password: &str, config: &WalletConfig) -> Result<EncryptedContainer> {
    let count = wallet.accounts().len();
    if count > config.max_accounts_per_wallet as usize {
        return Err(WalletError::AccountLimitExceeded {
            requested: u32::try_from(count).unwrap_or(u32::MAX),
            max: config.max_accounts_per_wallet,
        });
    }
    encrypt_wallet(wallet, password, &Pbkdf2Params::from_config(config))
}

fn locked_error() -> WalletError {
    WalletError::CryptoError {
        reason: "wallet is locked; call unlock() first".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smwallet_types::config::MIN_KDF_ITERATIONS;

    const ZERO_12: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    fn fast_config() -> WalletConfig {
        WalletConfig {
            kdf_iterations: MIN_KDF_ITERATIONS,
            ..WalletConfig::default()
        }
    }

    fn session() -> std::result::Result<WalletSession, WalletError> {
        let config = fast_config();
        let wallet = Wallet::from_mnemonic(ZERO_12, 1, &config)?;
        WalletSession::from_wallet(wallet, "pw", config)
    }

    #[test]
    fn starts_unlocked_from_wallet() -> std::result::Result<(), WalletError> {
        let s = session()?;
        assert!(s.is_unlocked());
        assert_eq!(s.wallet()?.accounts().len(), 1);
        Ok(())
    }

    #[test]
    fn configured_iterations_reach_the_container() -> std::result::Result<(), WalletError> {
        let config = WalletConfig {
            kdf_iterations: 5000,
            ..WalletConfig::default()
        };
        let wallet = Wallet::from_mnemonic(ZERO_12, 1, &config)?;
        let mut s = WalletSession::from_wallet(wallet, "pw", config)?;
        assert_eq!(s.container().kdf_params.iterations, 5000);

        s.reseal("pw")?;
        assert_eq!(s.container().kdf_params.iterations, 5000);
        Ok(())
    }

    #[test]
    fn lock_then_access_fails() -> std::result::Result<(), WalletError> {
        let mut s = session()?;
        s.lock();
        assert!(!s.is_unlocked());
        assert!(matches!(s.wallet(), Err(WalletError::CryptoError { .. })));
        assert!(matches!(s.wallet_mut(), Err(WalletError::CryptoError { .. })));
        assert!(matches!(s.add_account(), Err(WalletError::CryptoError { .. })));
        assert!(s.reseal("pw").is_err());
        Ok(())
    }

    #[test]
    fn wrong_password_stays_locked() -> std::result::Result<(), WalletError> {
        let mut s = session()?;
        s.lock();
        assert!(matches!(s.unlock("nope"), Err(WalletError::DecryptionFailed)));
        assert!(!s.is_unlocked());
        s.unlock("pw")?;
        assert!(s.is_unlocked());
        Ok(())
    }

    #[test]
    fn unlock_when_unlocked_is_noop() -> std::result::Result<(), WalletError> {
        let mut s = session()?;
        s.unlock("any password at all")?;
        assert!(s.is_unlocked());
        Ok(())
    }

    #[test]
    fn reseal_persists_new_accounts_and_password() -> std::result::Result<(), WalletError> {
        let mut s = session()?;
        s.add_account()?;
        s.reseal("new-pw")?;

        let mut reopened = WalletSession::new(s.into_container(), fast_config());
        assert!(reopened.unlock("pw").is_err());
        reopened.unlock("new-pw")?;
        assert_eq!(reopened.wallet()?.accounts().len(), 2);
        Ok(())
    }

    #[test]
    fn add_account_respects_session_limit() -> std::result::Result<(), WalletError> {
        let config = WalletConfig {
            max_accounts_per_wallet: 1,
            ..fast_config()
        };
        let wallet = Wallet::from_mnemonic(ZERO_12, 1, &config)?;
        let mut s = WalletSession::from_wallet(wallet, "pw", config)?;
        assert!(matches!(
            s.add_account(),
            Err(WalletError::AccountLimitExceeded { requested: 1, max: 1 })
        ));
        Ok(())
    }

    #[test]
    fn reseal_refuses_wallet_grown_past_limit() -> std::result::Result<(), WalletError> {
        let config = WalletConfig {
            max_accounts_per_wallet: 1,
            ..fast_config()
        };
        let wallet = Wallet::from_mnemonic(ZERO_12, 1, &config)?;
        let mut s = WalletSession::from_wallet(wallet, "pw", config)?;
        let before = s.container().clone();

        s.wallet_mut()?.add_account(&fast_config())?;
        assert!(matches!(
            s.reseal("pw"),
            Err(WalletError::AccountLimitExceeded { requested: 2, max: 1 })
        ));
        assert_eq!(s.container(), &before);

        s.lock();
        s.unlock("pw")?;
        assert_eq!(s.wallet()?.accounts().len(), 1);
        Ok(())
    }
}
