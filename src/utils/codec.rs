//! Hex codecs for the fixed-size values that cross the wire.
//!
//! Block hashes, public keys and signatures are raw bytes in memory and
//! lowercase hex strings in JSON. Conversions happen here and nowhere else.

use crate::error::{BlockchainError, Result};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::{Deserialize, Deserializer, Serializer};

pub const HASH_LEN: usize = 32;
const COORDINATE_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;
const UNCOMPRESSED_TAG: u8 = 0x04;

/// SHA-256 digest of a block.
pub type Hash = [u8; HASH_LEN];

pub fn encode_hash(hash: &Hash) -> String {
    HEXLOWER.encode(hash)
}

pub fn decode_hash(hex: &str) -> Result<Hash> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .map_err(|e| BlockchainError::Crypto(format!("Invalid hash hex: {e}")))?;
    if bytes.len() != HASH_LEN {
        return Err(BlockchainError::Crypto(format!(
            "Hash must be {HASH_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// Serde adapter: `#[serde(with = "hex_hash")]`.
pub mod hex_hash {
    use super::*;

    pub fn serialize<S: Serializer>(
        hash: &Hash,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hash(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Hash, D::Error> {
        let hex = String::deserialize(deserializer)?;
        decode_hash(&hex).map_err(serde::de::Error::custom)
    }
}

/// Uncompressed P-256 public key (0x04 || X || Y).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicKey> {
        if bytes.len() != 1 + 2 * COORDINATE_LEN || bytes[0] != UNCOMPRESSED_TAG {
            return Err(BlockchainError::Crypto(
                "Public key must be an uncompressed P-256 point".to_string(),
            ));
        }
        Ok(PublicKey(bytes.to_vec()))
    }

    /// Accepts the 128-char `X||Y` form, or the same prefixed with `04`.
    pub fn from_hex(hex: &str) -> Result<PublicKey> {
        let bytes = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|e| BlockchainError::Crypto(format!("Invalid public key hex: {e}")))?;
        if bytes.len() == 2 * COORDINATE_LEN {
            let mut full = Vec::with_capacity(1 + bytes.len());
            full.push(UNCOMPRESSED_TAG);
            full.extend(bytes);
            return PublicKey::from_bytes(&full);
        }
        PublicKey::from_bytes(&bytes)
    }

    /// 128 hex chars, X then Y.
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0[1..])
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// Fixed-size ECDSA signature, r || s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(BlockchainError::Crypto(format!(
                "Signature must be {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Signature(bytes.to_vec()))
    }

    pub fn from_hex(hex: &str) -> Result<Signature> {
        let bytes = HEXLOWER_PERMISSIVE
            .decode(hex.as_bytes())
            .map_err(|e| BlockchainError::Crypto(format!("Invalid signature hex: {e}")))?;
        Signature::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_hex_is_fixed_length() {
        let mut hash = [0u8; HASH_LEN];
        hash[0] = 0xab;
        let hex = encode_hash(&hash);
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab00"));
        assert_eq!(decode_hash(&hex).unwrap(), hash);
    }

    #[test]
    fn test_decode_hash_rejects_wrong_length() {
        assert!(decode_hash("abcd").is_err());
        assert!(decode_hash("zz").is_err());
    }

    #[test]
    fn test_public_key_accepts_both_forms() {
        let xy = "11".repeat(64);
        let short = PublicKey::from_hex(&xy).unwrap();
        let long = PublicKey::from_hex(&format!("04{xy}")).unwrap();
        assert_eq!(short, long);
        assert_eq!(short.to_hex(), xy);
        assert_eq!(short.as_bytes()[0], UNCOMPRESSED_TAG);
    }

    #[test]
    fn test_public_key_rejects_garbage() {
        assert!(PublicKey::from_hex("1234").is_err());
        assert!(PublicKey::from_hex(&format!("05{}", "11".repeat(64))).is_err());
    }

    #[test]
    fn test_signature_length_is_checked() {
        assert!(Signature::from_hex(&"ab".repeat(64)).is_ok());
        assert!(Signature::from_hex(&"ab".repeat(63)).is_err());
    }
}
