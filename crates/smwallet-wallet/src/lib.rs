//! Wallet aggregate and password-protected storage for smwallet.
//!
//! - **Create** a wallet from a fresh or imported BIP39 mnemonic
//! - **Derive** further accounts on demand
//! - **Seal / open** the wallet as an encrypted JSON container
//!   (PBKDF2 + XChaCha20-Poly1305)
//! - **Persist** containers atomically to disk
//! - **Lock / unlock** a loaded container with a password

pub mod container;
pub mod hex_codec;
pub mod session;
pub mod wallet;
pub mod wallet_file;
