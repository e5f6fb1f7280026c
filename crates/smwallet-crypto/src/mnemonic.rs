//! BIP39 mnemonic generation, validation, and seed derivation.
//!
//! Word-list handling and checksum math are delegated to the `bip39`
//! crate (English word list). This module adds the wallet's own
//! constraints on top:
//!
//! 1. **Generation**: only the five BIP39 entropy widths are accepted;
//!    anything else fails with [`WalletError::InvalidEntropySize`].
//! 2. **Validation**: word count, word-list membership and the embedded
//!    checksum are all checked; failures map to
//!    [`WalletError::InvalidMnemonic`].
//! 3. **Seed derivation**: PBKDF2-HMAC-SHA512 with 2048 rounds and
//!    salt `"mnemonic" + passphrase`, producing a 64-byte seed. This
//!    step is permissive and never checks the word list or checksum;
//!    callers validate first when correctness matters.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki>

use bip39::Language;
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::Sha512;
use smwallet_types::config::SUPPORTED_ENTROPY_BITS;
use smwallet_types::{Result, WalletError};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// PBKDF2 rounds fixed by BIP39.
const SEED_ROUNDS: u32 = 2048;

// ---------------------------------------------------------------------------
// Mnemonic
// ---------------------------------------------------------------------------

/// A validated BIP39 mnemonic phrase in normalized form (single spaces).
///
/// The inner string is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic(String);

impl Mnemonic {
    /// Parses and validates a phrase, normalizing whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidMnemonic`] on a bad word count, an
    /// unknown word, or a checksum mismatch.
    pub fn parse(phrase: &str) -> Result<Self> {
        let parsed = bip39::Mnemonic::parse_in_normalized(Language::English, phrase).map_err(
            |e| WalletError::InvalidMnemonic {
                reason: e.to_string(),
            },
        )?;
        Ok(Self(parsed.to_string()))
    }

    /// Returns the mnemonic phrase as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the individual words.
    pub fn words(&self) -> Vec<&str> {
        self.0.split(' ').collect()
    }

    /// Returns the number of words in the mnemonic.
    pub fn word_count(&self) -> usize {
        self.0.split(' ').count()
    }

    /// Stretches this mnemonic into a seed. See [`mnemonic_to_seed`].
    pub fn to_seed(&self, passphrase: &str) -> Result<Seed> {
        mnemonic_to_seed(&self.0, passphrase)
    }
}

// Mnemonic does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// A 64-byte seed derived from a mnemonic via PBKDF2-HMAC-SHA512.
///
/// Automatically zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Fixed byte length of a BIP39 seed.
    pub const LEN: usize = 64;

    /// Creates a [`Seed`] from a raw 64-byte array.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 64-byte seed.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generates a new random mnemonic with `entropy_bits` of OS entropy.
///
/// # Errors
///
/// - [`WalletError::InvalidEntropySize`] unless `entropy_bits` is one of
///   128, 160, 192, 224 or 256.
/// - [`WalletError::CryptoError`] if the OS entropy source fails.
pub fn generate_mnemonic(entropy_bits: usize) -> Result<Mnemonic> {
    generate_mnemonic_with_rng(entropy_bits, &mut OsRng)
}

/// Same as [`generate_mnemonic`] but draws entropy from `rng`.
pub fn generate_mnemonic_with_rng<R: RngCore + CryptoRng>(
    entropy_bits: usize,
    rng: &mut R,
) -> Result<Mnemonic> {
    if !SUPPORTED_ENTROPY_BITS.contains(&entropy_bits) {
        return Err(WalletError::InvalidEntropySize { bits: entropy_bits });
    }

    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    rng.try_fill_bytes(entropy.as_mut_slice())
        .map_err(|e| WalletError::CryptoError {
            reason: format!("entropy source failed: {e}"),
        })?;

    entropy_to_mnemonic(&entropy)
}

/// Converts raw entropy into a mnemonic.
///
/// Deterministic core of generation, exposed for known test vectors.
/// The entropy length must be 16, 20, 24, 28 or 32 bytes.
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<Mnemonic> {
    let bits = entropy.len() * 8;
    if !SUPPORTED_ENTROPY_BITS.contains(&bits) {
        return Err(WalletError::InvalidEntropySize { bits });
    }

    let mnemonic = bip39::Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|_| WalletError::InvalidEntropySize { bits })?;
    Ok(Mnemonic(mnemonic.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a mnemonic phrase.
///
/// # Errors
///
/// Returns [`WalletError::InvalidMnemonic`] describing the failed check.
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    Mnemonic::parse(phrase).map(|_| ())
}

/// Returns `true` if `phrase` passes every check in [`validate_mnemonic`].
pub fn is_valid_mnemonic(phrase: &str) -> bool {
    validate_mnemonic(phrase).is_ok()
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derives a 64-byte seed from a mnemonic and optional passphrase.
///
/// - **Password**: the mnemonic sentence bytes, as given.
/// - **Salt**: `"mnemonic"` concatenated with `passphrase`.
/// - **Algorithm**: PBKDF2-HMAC-SHA512, 2048 rounds, 64-byte output.
///
/// The phrase is not validated here.
pub fn mnemonic_to_seed(mnemonic: &str, passphrase: &str) -> Result<Seed> {
    let mut salt = Zeroizing::new(Vec::with_capacity(8 + passphrase.len()));
    salt.extend_from_slice(b"mnemonic");
    salt.extend_from_slice(passphrase.as_bytes());

    let mut output = [0u8; 64];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(mnemonic.as_bytes(), &salt, SEED_ROUNDS, &mut output)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("PBKDF2-HMAC-SHA512 failed: {e}"),
        })?;

    Ok(Seed(output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_12: &str = "abandon abandon abandon abandon abandon abandon \
                           abandon abandon abandon abandon abandon about";

    #[test]
    fn generate_word_counts_follow_entropy() -> std::result::Result<(), WalletError> {
        for (bits, words) in [(128, 12), (160, 15), (192, 18), (224, 21), (256, 24)] {
            let mnemonic = generate_mnemonic(bits)?;
            assert_eq!(mnemonic.word_count(), words);
        }
        Ok(())
    }

    #[test]
    fn generated_mnemonic_validates() -> std::result::Result<(), WalletError> {
        for bits in SUPPORTED_ENTROPY_BITS {
            let mnemonic = generate_mnemonic(bits)?;
            validate_mnemonic(mnemonic.as_str())?;
        }
        Ok(())
    }

    #[test]
    fn unsupported_entropy_rejected() {
        for bits in [0, 64, 127, 129, 255, 512] {
            let result = generate_mnemonic(bits);
            assert!(matches!(
                result,
                Err(WalletError::InvalidEntropySize { bits: b }) if b == bits
            ));
        }
    }

    #[test]
    fn entropy_to_mnemonic_rejects_odd_length() {
        let result = entropy_to_mnemonic(&[0u8; 17]);
        assert!(matches!(result, Err(WalletError::InvalidEntropySize { bits: 136 })));
    }

    #[test]
    fn entropy_all_zeros_128() -> std::result::Result<(), WalletError> {
        let mnemonic = entropy_to_mnemonic(&[0u8; 16])?;
        assert_eq!(mnemonic.as_str(), ZERO_12);
        Ok(())
    }

    #[test]
    fn parse_normalizes_whitespace() -> std::result::Result<(), WalletError> {
        let messy = format!("  {}\n", ZERO_12.replace(' ', "   "));
        let mnemonic = Mnemonic::parse(&messy)?;
        assert_eq!(mnemonic.as_str(), ZERO_12);
        assert_eq!(mnemonic.words().len(), 12);
        Ok(())
    }

    #[test]
    fn validate_rejects_wrong_word_count() {
        let result = validate_mnemonic("abandon abandon abandon");
        assert!(matches!(result, Err(WalletError::InvalidMnemonic { .. })));
    }

    #[test]
    fn validate_rejects_invalid_word() {
        let phrase = ZERO_12.replace("about", "notaword");
        assert!(!is_valid_mnemonic(&phrase));
    }

    #[test]
    fn validate_rejects_bad_checksum() {
        let words = vec!["abandon"; 12];
        assert!(!is_valid_mnemonic(&words.join(" ")));
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(!is_valid_mnemonic(""));
    }

    /// Well-known seed for the 12-word all-zero mnemonic, no passphrase.
    #[test]
    fn seed_zero_vector_empty_passphrase() -> std::result::Result<(), WalletError> {
        let seed = mnemonic_to_seed(ZERO_12, "")?;
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
        Ok(())
    }

    #[test]
    fn seed_stretch_is_permissive() -> std::result::Result<(), WalletError> {
        let seed = mnemonic_to_seed("not a real mnemonic", "")?;
        assert_eq!(seed.as_bytes().len(), Seed::LEN);
        Ok(())
    }

    #[test]
    fn passphrase_changes_seed() -> std::result::Result<(), WalletError> {
        let a = mnemonic_to_seed(ZERO_12, "")?;
        let b = mnemonic_to_seed(ZERO_12, "TREZOR")?;
        assert_ne!(a.as_bytes(), b.as_bytes());
        Ok(())
    }

    #[test]
    fn mnemonic_to_seed_method_matches_free_fn() -> std::result::Result<(), WalletError> {
        let mnemonic = Mnemonic::parse(ZERO_12)?;
        let a = mnemonic.to_seed("x")?;
        let b = mnemonic_to_seed(ZERO_12, "x")?;
        assert_eq!(a.as_bytes(), b.as_bytes());
        Ok(())
    }
}
