//! PBKDF2 key derivation for wallet encryption.
//!
//! Derives a 256-bit encryption key from a user-supplied password and a
//! random salt using PBKDF2-HMAC with SHA-256 or SHA-512. The iteration
//! count and the hash are recorded in the wallet container so that a
//! file written with one setting still opens after the defaults move.

use std::fmt;

use hmac::Hmac;
use sha2::{Sha256, Sha512};
use smwallet_types::config::{WalletConfig, MIN_KDF_ITERATIONS};
use smwallet_types::{Result, WalletError};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum acceptable salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

// ---------------------------------------------------------------------------
// HashAlgorithm
// ---------------------------------------------------------------------------

/// Hash function underneath the PBKDF2 HMAC.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm {
    /// HMAC-SHA-256.
    Sha256,
    /// HMAC-SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Canonical identifier as written to wallet files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Resolves an identifier, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UnsupportedAlgorithm`] for any other name.
    pub fn from_name(name: &str) -> Result<Self> {
        [Self::Sha256, Self::Sha512]
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| WalletError::UnsupportedAlgorithm {
                kind: "hash",
                name: name.to_string(),
            })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pbkdf2Params
// ---------------------------------------------------------------------------

/// Tunable PBKDF2 parameters.
///
/// | Parameter    | Default  |
/// |--------------|----------|
/// | `iterations` | 210 000  |
/// | `hash`       | SHA-512  |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pbkdf2Params {
    /// Iteration count. Must be at least [`MIN_KDF_ITERATIONS`].
    pub iterations: u32,
    /// HMAC hash function.
    pub hash: HashAlgorithm,
}

impl Default for Pbkdf2Params {
    fn default() -> Self {
        Self::from_config(&WalletConfig::default())
    }
}

impl Pbkdf2Params {
    /// SHA-512 with the iteration count from `config.kdf_iterations`.
    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            iterations: config.kdf_iterations,
            hash: HashAlgorithm::Sha512,
        }
    }

    /// Checks the iteration floor.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_KDF_ITERATIONS {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "PBKDF2 iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
                    self.iterations
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// 256-bit key derived by PBKDF2. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Fixed byte length of the derived key.
    pub const LEN: usize = 32;

    /// Returns the raw 32-byte key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// DerivedKey does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// Derives a 256-bit key from `password` and `salt`.
///
/// # Errors
///
/// - [`WalletError::ConfigError`] if the salt is shorter than
///   [`MIN_SALT_LEN`] or the iteration count is below the floor.
/// - [`WalletError::CryptoError`] if the PBKDF2 computation fails.
pub fn pbkdf2_derive_key(password: &[u8], salt: &[u8], params: &Pbkdf2Params) -> Result<DerivedKey> {
    if salt.len() < MIN_SALT_LEN {
        return Err(WalletError::ConfigError {
            reason: format!(
                "salt must be at least {MIN_SALT_LEN} bytes, got {}",
                salt.len()
            ),
        });
    }
    params.validate()?;

    let mut output = [0u8; DerivedKey::LEN];
    let outcome = match params.hash {
        HashAlgorithm::Sha256 => {
            pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, params.iterations, &mut output)
        }
        HashAlgorithm::Sha512 => {
            pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, params.iterations, &mut output)
        }
    };
    outcome.map_err(|e| WalletError::CryptoError {
        reason: format!("PBKDF2-HMAC-{} failed: {e}", params.hash),
    })?;

    Ok(DerivedKey(output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn salt_0_to_31() -> [u8; 32] {
        let mut salt = [0u8; 32];
        for (i, b) in salt.iter_mut().enumerate() {
            *b = i as u8;
        }
        salt
    }

    fn fast(hash: HashAlgorithm) -> Pbkdf2Params {
        Pbkdf2Params {
            iterations: MIN_KDF_ITERATIONS,
            hash,
        }
    }

    #[test]
    fn params_follow_config_iterations() {
        let config = WalletConfig {
            kdf_iterations: 500_000,
            ..WalletConfig::default()
        };
        let params = Pbkdf2Params::from_config(&config);
        assert_eq!(params.iterations, 500_000);
        assert_eq!(params.hash, HashAlgorithm::Sha512);
        assert_eq!(Pbkdf2Params::default().iterations, WalletConfig::default().kdf_iterations);
    }

    #[test]
    fn known_output_sha512() -> std::result::Result<(), WalletError> {
        let key = pbkdf2_derive_key(b"test1234", &salt_0_to_31(), &fast(HashAlgorithm::Sha512))?;
        assert_eq!(
            hex::encode(key.as_bytes()),
            "1eeaab047aa5c123551ccb1385c4c087dcecb1e2efbbfdfd87e8f8de3d60c63a"
        );
        Ok(())
    }

    #[test]
    fn known_output_sha256() -> std::result::Result<(), WalletError> {
        let key = pbkdf2_derive_key(b"test1234", &salt_0_to_31(), &fast(HashAlgorithm::Sha256))?;
        assert_eq!(
            hex::encode(key.as_bytes()),
            "0e3d5f6e701da5c4aa90d3313eeac6fd9430c7c985c78d5996384622d1808ef5"
        );
        Ok(())
    }

    #[test]
    fn different_password_different_key() -> std::result::Result<(), WalletError> {
        let params = fast(HashAlgorithm::Sha512);
        let a = pbkdf2_derive_key(b"password_a", &salt_0_to_31(), &params)?;
        let b = pbkdf2_derive_key(b"password_b", &salt_0_to_31(), &params)?;
        assert_ne!(a.as_bytes(), b.as_bytes());
        Ok(())
    }

    #[test]
    fn salt_too_short_rejected() {
        let result = pbkdf2_derive_key(b"pw", b"short", &fast(HashAlgorithm::Sha512));
        assert!(matches!(result, Err(WalletError::ConfigError { .. })));
    }

    #[test]
    fn low_iterations_rejected() {
        let params = Pbkdf2Params {
            iterations: MIN_KDF_ITERATIONS - 1,
            ..Pbkdf2Params::default()
        };
        let result = pbkdf2_derive_key(b"pw", &salt_0_to_31(), &params);
        assert!(matches!(result, Err(WalletError::ConfigError { .. })));
    }

    #[test]
    fn empty_password_is_allowed() -> std::result::Result<(), WalletError> {
        let key = pbkdf2_derive_key(b"", &salt_0_to_31(), &fast(HashAlgorithm::Sha256))?;
        assert_eq!(key.as_bytes().len(), DerivedKey::LEN);
        Ok(())
    }

    #[test]
    fn hash_names_are_case_insensitive() -> std::result::Result<(), WalletError> {
        assert_eq!(HashAlgorithm::from_name("sha-512")?, HashAlgorithm::Sha512);
        assert_eq!(HashAlgorithm::from_name("SHA-256")?, HashAlgorithm::Sha256);
        Ok(())
    }

    #[test]
    fn unknown_hash_rejected() {
        let result = HashAlgorithm::from_name("sha256");
        assert!(matches!(
            result,
            Err(WalletError::UnsupportedAlgorithm { kind: "hash", .. })
        ));
    }
}
