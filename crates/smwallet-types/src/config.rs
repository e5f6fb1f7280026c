//! Wallet configuration with sensible defaults.
//!
//! Limits that the derivation tree and the wallet aggregate depend on
//! are carried here and passed in explicitly; nothing in the workspace
//! reads them from global state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, WalletError};

/// Lowest PBKDF2 iteration count accepted for encryption or decryption.
pub const MIN_KDF_ITERATIONS: u32 = 4096;

/// Largest permitted `max_accounts_per_wallet`.
///
/// Child indices are hardened by setting bit 31, so the index itself
/// must stay below 2^31.
pub const MAX_ACCOUNT_LIMIT: u32 = 1 << 31;

/// Entropy widths (in bits) accepted for new mnemonics.
pub const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Wallet-level configuration.
///
/// Missing fields fall back to [`WalletConfig::default`] when loaded
/// from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Upper bound on the number of accounts a single wallet may hold.
    /// Valid indices are `0..max_accounts_per_wallet`.
    pub max_accounts_per_wallet: u32,

    /// Entropy width used when generating a fresh mnemonic.
    pub mnemonic_entropy_bits: usize,

    /// PBKDF2 iteration count used when encrypting a wallet.
    pub kdf_iterations: u32,

    /// Display name stamped on newly created wallets.
    pub default_display_name: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            max_accounts_per_wallet: 100,
            mnemonic_entropy_bits: 256,
            kdf_iterations: 210_000,
            default_display_name: "Main Wallet".into(),
        }
    }
}

impl WalletConfig {
    /// Validates all configuration values.
    ///
    /// Returns [`WalletError::ConfigError`] if any value is outside its
    /// acceptable range.
    pub fn validate(&self) -> Result<()> {
        if self.max_accounts_per_wallet == 0 || self.max_accounts_per_wallet > MAX_ACCOUNT_LIMIT {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "max_accounts_per_wallet must be 1..={MAX_ACCOUNT_LIMIT}, got {}",
                    self.max_accounts_per_wallet
                ),
            });
        }

        if !SUPPORTED_ENTROPY_BITS.contains(&self.mnemonic_entropy_bits) {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "mnemonic_entropy_bits must be one of {SUPPORTED_ENTROPY_BITS:?}, got {}",
                    self.mnemonic_entropy_bits
                ),
            });
        }

        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "kdf_iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
                    self.kdf_iterations
                ),
            });
        }

        if self.default_display_name.trim().is_empty() {
            return Err(WalletError::ConfigError {
                reason: "default_display_name must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| WalletError::ConfigError {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| WalletError::ConfigError {
            reason: format!("failed to parse config file '{}': {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WalletConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_values() {
        let config = WalletConfig::default();
        assert_eq!(config.max_accounts_per_wallet, 100);
        assert_eq!(config.mnemonic_entropy_bits, 256);
        assert_eq!(config.kdf_iterations, 210_000);
        assert_eq!(config.default_display_name, "Main Wallet");
    }

    #[test]
    fn zero_max_accounts_rejected() {
        let config = WalletConfig {
            max_accounts_per_wallet: 0,
            ..WalletConfig::default()
        };
        assert!(matches!(config.validate(), Err(WalletError::ConfigError { .. })));
    }

    #[test]
    fn max_accounts_above_hardened_bit_rejected() {
        let config = WalletConfig {
            max_accounts_per_wallet: MAX_ACCOUNT_LIMIT + 1,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_accounts_at_limit_is_valid() {
        let config = WalletConfig {
            max_accounts_per_wallet: MAX_ACCOUNT_LIMIT,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unsupported_entropy_rejected() {
        let config = WalletConfig {
            mnemonic_entropy_bits: 100,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn every_supported_entropy_accepted() {
        for bits in SUPPORTED_ENTROPY_BITS {
            let config = WalletConfig {
                mnemonic_entropy_bits: bits,
                ..WalletConfig::default()
            };
            assert!(config.validate().is_ok(), "{bits} bits rejected");
        }
    }

    #[test]
    fn low_kdf_iterations_rejected() {
        let config = WalletConfig {
            kdf_iterations: MIN_KDF_ITERATIONS - 1,
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_display_name_rejected() {
        let config = WalletConfig {
            default_display_name: "   ".into(),
            ..WalletConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let parsed: WalletConfig = serde_json::from_str(r#"{"max_accounts_per_wallet": 5}"#)?;
        assert_eq!(parsed.max_accounts_per_wallet, 5);
        assert_eq!(parsed.kdf_iterations, 210_000);
        assert_eq!(parsed.default_display_name, "Main Wallet");
        Ok(())
    }

    #[test]
    fn config_serde_roundtrip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = WalletConfig::default();
        let json = serde_json::to_string(&config)?;
        let parsed: WalletConfig = serde_json::from_str(&json)?;
        assert_eq!(config, parsed);
        Ok(())
    }

    #[test]
    fn from_json_file_loads_and_validates() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("smwallet_cfg_good_{}.json", std::process::id()));
        let bad = dir.join(format!("smwallet_cfg_bad_{}.json", std::process::id()));
        std::fs::write(&good, r#"{"kdf_iterations": 5000}"#)?;
        std::fs::write(&bad, r#"{"kdf_iterations": 10}"#)?;

        let loaded = WalletConfig::from_json_file(&good);
        let rejected = WalletConfig::from_json_file(&bad);
        let _ = std::fs::remove_file(&good);
        let _ = std::fs::remove_file(&bad);

        assert_eq!(loaded?.kdf_iterations, 5000);
        assert!(matches!(rejected, Err(WalletError::ConfigError { .. })));
        Ok(())
    }

    #[test]
    fn from_json_file_missing_is_config_error() {
        let path = std::env::temp_dir().join("smwallet_cfg_does_not_exist.json");
        let result = WalletConfig::from_json_file(&path);
        assert!(matches!(result, Err(WalletError::ConfigError { .. })));
    }
}
