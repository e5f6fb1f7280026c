//! Hex codec for binary fields in the textual wallet format.
//!
//! Encoding always produces lowercase. Decoding accepts either case.

use smwallet_types::{Result, WalletError};
use zeroize::Zeroizing;

/// Encodes `bytes` as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a hex string of any even length, including the empty string.
///
/// # Errors
///
/// [`WalletError::MalformedHex`] on odd length or a non-hex character.
pub fn decode(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| WalletError::MalformedHex {
        reason: e.to_string(),
    })
}

/// Decodes a hex field that must be exactly `N` bytes long.
///
/// `field` names the value in error messages. The intermediate buffer
/// is wiped before returning, so this is safe for key material as long
/// as the caller wipes the returned array.
pub fn decode_fixed<const N: usize>(s: &str, field: &str) -> Result<[u8; N]> {
    let bytes = Zeroizing::new(decode(s).map_err(|e| WalletError::MalformedHex {
        reason: format!("{field}: {e}"),
    })?);
    if bytes.len() != N {
        return Err(WalletError::MalformedHex {
            reason: format!("{field} must be {N} bytes, got {}", bytes.len()),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_lowercase() {
        assert_eq!(encode(&[0xAB, 0xCD, 0x01]), "abcd01");
    }

    #[test]
    fn empty_roundtrip() -> std::result::Result<(), WalletError> {
        assert_eq!(encode(&[]), "");
        assert!(decode("")?.is_empty());
        Ok(())
    }

    #[test]
    fn arbitrary_bytes_roundtrip() -> std::result::Result<(), WalletError> {
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&encode(&bytes))?, bytes);
        Ok(())
    }

    #[test]
    fn mixed_case_accepted() -> std::result::Result<(), WalletError> {
        assert_eq!(decode("DeadBEEF")?, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        Ok(())
    }

    #[test]
    fn odd_length_rejected() {
        assert!(matches!(decode("abc"), Err(WalletError::MalformedHex { .. })));
    }

    #[test]
    fn invalid_character_rejected() {
        assert!(matches!(decode("zz"), Err(WalletError::MalformedHex { .. })));
        assert!(matches!(decode("0x12"), Err(WalletError::MalformedHex { .. })));
    }

    #[test]
    fn decode_fixed_checks_width() -> std::result::Result<(), WalletError> {
        let arr: [u8; 2] = decode_fixed("beef", "tag")?;
        assert_eq!(arr, [0xBE, 0xEF]);

        let err = decode_fixed::<3>("beef", "tag");
        assert!(matches!(err, Err(WalletError::MalformedHex { ref reason }) if reason.contains("tag")));
        Ok(())
    }

    #[test]
    fn decode_fixed_key_width() -> std::result::Result<(), WalletError> {
        let key: [u8; 64] = decode_fixed(&"AB".repeat(64), "privateKey")?;
        assert_eq!(key, [0xAB; 64]);

        for bad in ["ab".repeat(63), "ab".repeat(65), "zz".repeat(64)] {
            assert!(matches!(
                decode_fixed::<64>(&bad, "privateKey"),
                Err(WalletError::MalformedHex { ref reason }) if reason.contains("privateKey")
            ));
        }
        Ok(())
    }
}
