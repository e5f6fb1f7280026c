//! Password-protected wallet container.
//!
//! The container keeps [`WalletMetadata`] in the clear and seals the
//! mnemonic and accounts with XChaCha20-Poly1305 under a PBKDF2 key.
//! Every parameter needed to re-derive the key travels with the
//! ciphertext, and the parameters are bound to it as associated data,
//! so swapping the salt, hash or iteration count breaks authentication.
//!
//! # Textual form
//!
//! ```json
//! {
//!   "meta": {"displayName": "...", "created": "2024-01-01T00:00:00Z", "genesisID": ""},
//!   "crypto": {
//!     "cipher": "XChaCha20-Poly1305",
//!     "cipherText": "<hex>",
//!     "cipherParams": {"iv": "<hex>"},
//!     "kdf": "PBKDF2",
//!     "kdfparams": {"dklen": 32, "hash": "SHA-512", "salt": "<hex>", "iterations": 210000}
//!   }
//! }
//! ```
//!
//! Decoding checks, in order: JSON structure, hex fields, algorithm
//! identifiers, then parameter ranges.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use smwallet_crypto::aead::{
    decrypt_xchacha20, encrypt_xchacha20, generate_aead_nonce_with, AeadNonce, CIPHER_NAME,
    TAG_LEN,
};
use smwallet_crypto::hd_derive::AccountKeyPair;
use smwallet_crypto::kdf::{
    pbkdf2_derive_key, DerivedKey, HashAlgorithm, Pbkdf2Params, MIN_SALT_LEN,
};
use smwallet_crypto::mnemonic::Mnemonic;
use smwallet_types::config::{WalletConfig, MIN_KDF_ITERATIONS};
use smwallet_types::{Result, WalletError};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::hex_codec;
use crate::wallet::{Wallet, WalletMetadata, WalletSecrets};

/// Salt length written by the encoder.
pub const SALT_LEN: usize = 32;

/// Derived key length; the only value the cipher accepts.
pub const DKLEN: u32 = DerivedKey::LEN as u32;

const AAD_PREFIX: &[u8] = b"smwallet:container:v1:";

// ---------------------------------------------------------------------------
// Algorithm identifiers
// ---------------------------------------------------------------------------

/// Symmetric cipher used for the secrets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CipherAlgorithm {
    /// XChaCha20-Poly1305 with a 24-byte IV.
    XChaCha20Poly1305,
}

impl CipherAlgorithm {
    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => CIPHER_NAME,
        }
    }

    /// Resolves an identifier, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        if CIPHER_NAME.eq_ignore_ascii_case(name) {
            Ok(Self::XChaCha20Poly1305)
        } else {
            Err(WalletError::UnsupportedAlgorithm {
                kind: "cipher",
                name: name.to_string(),
            })
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Password-based key derivation function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KdfAlgorithm {
    /// PBKDF2-HMAC.
    Pbkdf2,
}

impl KdfAlgorithm {
    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pbkdf2 => "PBKDF2",
        }
    }

    /// Resolves an identifier, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        if "PBKDF2".eq_ignore_ascii_case(name) {
            Ok(Self::Pbkdf2)
        } else {
            Err(WalletError::UnsupportedAlgorithm {
                kind: "kdf",
                name: name.to_string(),
            })
        }
    }
}

impl fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EncryptedContainer
// ---------------------------------------------------------------------------

/// KDF parameters stored alongside the ciphertext.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KdfParams {
    /// Derived key length in bytes. Always 32.
    pub dklen: u32,
    /// HMAC hash function.
    pub hash: HashAlgorithm,
    /// Random salt, unique per encryption.
    pub salt: Vec<u8>,
    /// Iteration count.
    pub iterations: u32,
}

/// A sealed wallet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedContainer {
    /// Cleartext metadata.
    pub meta: WalletMetadata,
    /// Cipher identifier.
    pub cipher: CipherAlgorithm,
    /// Ciphertext with the authentication tag appended.
    pub ciphertext: Vec<u8>,
    /// Cipher IV, unique per encryption.
    pub iv: [u8; AeadNonce::LEN],
    /// KDF identifier.
    pub kdf: KdfAlgorithm,
    /// KDF parameters.
    pub kdf_params: KdfParams,
}

impl EncryptedContainer {
    /// Renders the container as pretty-printed JSON with lowercase hex.
    pub fn to_json(&self) -> Result<String> {
        let doc = ContainerDoc {
            meta: self.meta.clone(),
            crypto: CryptoDoc {
                cipher: self.cipher.as_str().to_string(),
                cipher_text: hex_codec::encode(&self.ciphertext),
                cipher_params: CipherParamsDoc {
                    iv: hex_codec::encode(&self.iv),
                },
                kdf: self.kdf.as_str().to_string(),
                kdfparams: KdfParamsDoc {
                    dklen: self.kdf_params.dklen,
                    hash: self.kdf_params.hash.as_str().to_string(),
                    salt: hex_codec::encode(&self.kdf_params.salt),
                    iterations: self.kdf_params.iterations,
                },
            },
        };
        serde_json::to_string_pretty(&doc).map_err(|e| WalletError::MalformedContainer {
            reason: format!("serialization failed: {e}"),
        })
    }

    /// Parses and checks a container.
    ///
    /// # Errors
    ///
    /// In checking order: [`WalletError::MalformedContainer`] for bad
    /// JSON, [`WalletError::MalformedHex`] for bad hex,
    /// [`WalletError::UnsupportedAlgorithm`] for unknown identifiers,
    /// and [`WalletError::MalformedContainer`] for out-of-range
    /// parameters.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: ContainerDoc =
            serde_json::from_str(text).map_err(|e| WalletError::MalformedContainer {
                reason: e.to_string(),
            })?;
        let crypto = doc.crypto;

        let ciphertext =
            hex_codec::decode(&crypto.cipher_text).map_err(|e| with_field("cipherText", e))?;
        let iv = hex_codec::decode(&crypto.cipher_params.iv).map_err(|e| with_field("iv", e))?;
        let salt =
            hex_codec::decode(&crypto.kdfparams.salt).map_err(|e| with_field("salt", e))?;

        let cipher = CipherAlgorithm::from_name(&crypto.cipher)?;
        let kdf = KdfAlgorithm::from_name(&crypto.kdf)?;
        let hash = HashAlgorithm::from_name(&crypto.kdfparams.hash)?;

        let iv: [u8; AeadNonce::LEN] = iv.try_into().map_err(|iv: Vec<u8>| {
            WalletError::MalformedContainer {
                reason: format!("iv must be {} bytes, got {}", AeadNonce::LEN, iv.len()),
            }
        })?;

        let container = Self {
            meta: doc.meta,
            cipher,
            ciphertext,
            iv,
            kdf,
            kdf_params: KdfParams {
                dklen: crypto.kdfparams.dklen,
                hash,
                salt,
                iterations: crypto.kdfparams.iterations,
            },
        };
        container.check_ranges()?;
        Ok(container)
    }

    fn check_ranges(&self) -> Result<()> {
        let params = &self.kdf_params;
        if params.dklen != DKLEN {
            return Err(WalletError::MalformedContainer {
                reason: format!("dklen must be {DKLEN}, got {}", params.dklen),
            });
        }
        if params.salt.len() < MIN_SALT_LEN {
            return Err(WalletError::MalformedContainer {
                reason: format!(
                    "salt must be at least {MIN_SALT_LEN} bytes, got {}",
                    params.salt.len()
                ),
            });
        }
        if params.iterations < MIN_KDF_ITERATIONS {
            return Err(WalletError::MalformedContainer {
                reason: format!(
                    "iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
                    params.iterations
                ),
            });
        }
        if self.ciphertext.len() < TAG_LEN {
            return Err(WalletError::MalformedContainer {
                reason: format!("ciphertext shorter than the {TAG_LEN}-byte tag"),
            });
        }
        Ok(())
    }

    fn aad(&self) -> Vec<u8> {
        let params = &self.kdf_params;
        let mut aad = Vec::with_capacity(AAD_PREFIX.len() + 64 + params.salt.len());
        aad.extend_from_slice(AAD_PREFIX);
        aad.extend_from_slice(self.cipher.as_str().as_bytes());
        aad.push(b':');
        aad.extend_from_slice(self.kdf.as_str().as_bytes());
        aad.push(b':');
        aad.extend_from_slice(params.hash.as_str().as_bytes());
        aad.push(b':');
        aad.extend_from_slice(&params.iterations.to_be_bytes());
        aad.extend_from_slice(&params.dklen.to_be_bytes());
        aad.extend_from_slice(&params.salt);
        aad
    }
}

fn with_field(field: &str, err: WalletError) -> WalletError {
    match err {
        WalletError::MalformedHex { reason } => WalletError::MalformedHex {
            reason: format!("{field}: {reason}"),
        },
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Seals `wallet` under `password` with a fresh salt and IV from the OS.
pub fn encrypt_wallet(
    wallet: &Wallet,
    password: &str,
    kdf: &Pbkdf2Params,
) -> Result<EncryptedContainer> {
    encrypt_wallet_with_rng(wallet, password, kdf, &mut OsRng)
}

/// Seals `wallet`, drawing the salt (first 32 bytes) and then the IV
/// (next 24 bytes) from `rng`.
pub fn encrypt_wallet_with_rng<R: RngCore + CryptoRng>(
    wallet: &Wallet,
    password: &str,
    kdf: &Pbkdf2Params,
    rng: &mut R,
) -> Result<EncryptedContainer> {
    kdf.validate()?;

    let mut salt = vec![0u8; SALT_LEN];
    rng.try_fill_bytes(&mut salt)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("failed to generate random salt: {e}"),
        })?;
    let nonce = generate_aead_nonce_with(rng)?;

    let mut container = EncryptedContainer {
        meta: wallet.meta().clone(),
        cipher: CipherAlgorithm::XChaCha20Poly1305,
        ciphertext: Vec::new(),
        iv: *nonce.as_bytes(),
        kdf: KdfAlgorithm::Pbkdf2,
        kdf_params: KdfParams {
            dklen: DKLEN,
            hash: kdf.hash,
            salt,
            iterations: kdf.iterations,
        },
    };

    let key = pbkdf2_derive_key(password.as_bytes(), &container.kdf_params.salt, kdf)?;
    let plaintext = encode_secrets(wallet.secrets())?;
    container.ciphertext =
        encrypt_xchacha20(key.as_bytes(), &nonce, &plaintext, &container.aad())?;

    tracing::debug!(
        iterations = kdf.iterations,
        hash = %kdf.hash,
        accounts = wallet.accounts().len(),
        "wallet encrypted"
    );
    Ok(container)
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Opens a container with `password`.
///
/// # Errors
///
/// - [`WalletError::MalformedContainer`] if the stored parameters are
///   out of range.
/// - [`WalletError::DecryptionFailed`] for a wrong password, a tampered
///   container, or a payload that fails any structural check. The
///   cause is not reported.
pub fn decrypt_wallet(
    container: &EncryptedContainer,
    password: &str,
    config: &WalletConfig,
) -> Result<Wallet> {
    container.check_ranges()?;

    let params = Pbkdf2Params {
        iterations: container.kdf_params.iterations,
        hash: container.kdf_params.hash,
    };
    let key = pbkdf2_derive_key(password.as_bytes(), &container.kdf_params.salt, &params)?;
    let nonce = AeadNonce::from_bytes(container.iv);
    let plaintext = decrypt_xchacha20(
        key.as_bytes(),
        &nonce,
        &container.ciphertext,
        &container.aad(),
    )?;

    let secrets = decode_secrets(&plaintext, config).map_err(|_| WalletError::DecryptionFailed)?;
    let wallet = Wallet::from_parts(container.meta.clone(), secrets, config)
        .map_err(|_| WalletError::DecryptionFailed)?;

    tracing::debug!(accounts = wallet.accounts().len(), "wallet decrypted");
    Ok(wallet)
}

// ---------------------------------------------------------------------------
// Plaintext payload
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SecretsDoc {
    mnemonic: String,
    accounts: Vec<AccountDoc>,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct AccountDoc {
    index: u32,
    public_key: String,
    private_key: String,
}

fn encode_secrets(secrets: &WalletSecrets) -> Result<Zeroizing<Vec<u8>>> {
    let doc = SecretsDoc {
        mnemonic: secrets.mnemonic().to_string(),
        accounts: secrets
            .accounts()
            .iter()
            .map(|account| AccountDoc {
                index: account.index(),
                public_key: hex_codec::encode(account.public_key().as_bytes()),
                private_key: hex_codec::encode(&*account.to_keypair_bytes()),
            })
            .collect(),
    };
    serde_json::to_vec(&doc)
        .map(Zeroizing::new)
        .map_err(|e| WalletError::CryptoError {
            reason: format!("failed to serialize wallet secrets: {e}"),
        })
}

fn decode_secrets(plaintext: &[u8], config: &WalletConfig) -> Result<WalletSecrets> {
    let doc: SecretsDoc =
        serde_json::from_slice(plaintext).map_err(|e| WalletError::MalformedContainer {
            reason: format!("secrets payload: {e}"),
        })?;

    if doc.accounts.len() > config.max_accounts_per_wallet as usize {
        return Err(WalletError::AccountLimitExceeded {
            requested: u32::try_from(doc.accounts.len()).unwrap_or(u32::MAX),
            max: config.max_accounts_per_wallet,
        });
    }

    let mnemonic = Mnemonic::parse(&doc.mnemonic)?;
    let accounts = doc
        .accounts
        .iter()
        .map(|entry| {
            let private_key =
                Zeroizing::new(hex_codec::decode_fixed::<64>(&entry.private_key, "privateKey")?);
            let public_key = hex_codec::decode_fixed::<32>(&entry.public_key, "publicKey")?;
            let account = AccountKeyPair::from_keypair_bytes(entry.index, &private_key)?;
            if account.public_key().as_bytes() != &public_key {
                return Err(WalletError::MalformedContainer {
                    reason: format!("account {} public key mismatch", entry.index),
                });
            }
            Ok(account)
        })
        .collect::<Result<Vec<_>>>()?;

    WalletSecrets::new(mnemonic, accounts)
}

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ContainerDoc {
    meta: WalletMetadata,
    crypto: CryptoDoc,
}

#[derive(Serialize, Deserialize)]
struct CryptoDoc {
    cipher: String,
    #[serde(rename = "cipherText")]
    cipher_text: String,
    #[serde(rename = "cipherParams")]
    cipher_params: CipherParamsDoc,
    kdf: String,
    kdfparams: KdfParamsDoc,
}

#[derive(Serialize, Deserialize)]
struct CipherParamsDoc {
    iv: String,
}

#[derive(Serialize, Deserialize)]
struct KdfParamsDoc {
    dklen: u32,
    hash: String,
    salt: String,
    iterations: u32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
