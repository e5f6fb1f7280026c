//! Container persistence.
//!
//! Files hold the textual container form verbatim. Writes go to a
//! sibling `.tmp` file first and are renamed into place, so a crash
//! never leaves a truncated wallet behind.

use std::path::Path;

use smwallet_types::{Result, WalletError};

use crate::container::EncryptedContainer;

/// Writes `container` to `path`, replacing any existing file.
pub fn save_container(path: &Path, container: &EncryptedContainer) -> Result<()> {
    let json = container.to_json()?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| WalletError::StorageError {
        reason: format!("failed to write wallet file: {e}"),
    })?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        WalletError::StorageError {
            reason: format!("failed to rename wallet file: {e}"),
        }
    })?;

    tracing::info!(path = %path.display(), "wallet saved");
    Ok(())
}

/// Reads and parses the container at `path`.
///
/// The result is still sealed; open it with
/// [`decrypt_wallet`](crate::container::decrypt_wallet) or a
/// [`WalletSession`](crate::session::WalletSession).
///
/// # Errors
///
/// [`WalletError::StorageError`] if the file is missing or unreadable,
/// otherwise whatever [`EncryptedContainer::from_json`] reports.
pub fn load_container(path: &Path) -> Result<EncryptedContainer> {
    if !path.exists() {
        return Err(WalletError::StorageError {
            reason: format!("wallet file not found: {}", path.display()),
        });
    }

    let json = std::fs::read_to_string(path).map_err(|e| WalletError::StorageError {
        reason: format!("failed to read wallet file: {e}"),
    })?;
    let container = EncryptedContainer::from_json(&json)?;

    tracing::info!(path = %path.display(), "wallet loaded");
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            Self(std::env::temp_dir().join(format!(
                "smwallet_file_{name}_{}.json",
                std::process::id()
            )))
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn missing_file_is_storage_error() {
        let tmp = TempFile::new("missing");
        assert!(matches!(
            load_container(&tmp.0),
            Err(WalletError::StorageError { .. })
        ));
    }

    #[test]
    fn garbage_file_is_malformed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let tmp = TempFile::new("garbage");
        std::fs::write(&tmp.0, b"not a wallet")?;
        assert!(matches!(
            load_container(&tmp.0),
            Err(WalletError::MalformedContainer { .. })
        ));
        Ok(())
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join(format!("smwallet_no_such_dir_{}", std::process::id()))
            .join("wallet.json");
        let container = match EncryptedContainer::from_json(include_str!(
            "../tests/fixtures/golden_wallet.json"
        )) {
            Ok(c) => c,
            Err(e) => panic!("fixture should parse: {e}"),
        };
        assert!(matches!(
            save_container(&path, &container),
            Err(WalletError::StorageError { .. })
        ));
    }
}
