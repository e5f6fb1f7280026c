//! Cryptographic primitives for the smwallet identity manager.
//!
//! This crate is the only place in the workspace that touches raw
//! cryptography. Higher layers work with the typed wrappers exported
//! here and never see HMAC or cipher state directly.
//!
//! # Modules
//!
//! - [`mnemonic`]: BIP39 mnemonic generation, validation and seed stretch
//! - [`signing`]: Ed25519 keypairs, signing and verification
//! - [`hd_derive`]: master and account key derivation from a seed
//! - [`kdf`]: PBKDF2 password-based key derivation
//! - [`aead`]: XChaCha20-Poly1305 authenticated encryption
//! - [`address`]: SHA3-256 account addresses and their Bech32 display form

pub mod address;
pub mod aead;
pub mod hd_derive;
pub mod kdf;
pub mod mnemonic;
pub mod signing;
