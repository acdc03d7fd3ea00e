//! secp256k1 private keys.

use k256::ecdsa::{SigningKey, VerifyingKey};
use retrovote_types::Address;
use zeroize::Zeroizing;

use crate::address::address_from_verifying_key;
use crate::CryptoError;

/// A secp256k1 private key.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. The inner `SigningKey` zeroizes on drop.
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parse a 64-character hex private key, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(CryptoError::InvalidPrivateKey(
                "private key must be 64 hex characters".into(),
            ));
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(digits, &mut *bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Build a key from a raw 32-byte scalar. Zero and out-of-range scalars are rejected.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPrivateKey("scalar out of range".into()))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.0
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.0.verifying_key()
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.verifying_key())
    }

    /// Lowercase hex of the secret scalar, without prefix.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn known_key_derives_known_address() {
        let key = PrivateKey::from_hex(KNOWN_KEY).unwrap();
        assert_eq!(
            key.address().to_string(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }

    #[test]
    fn prefix_is_optional() {
        let a = PrivateKey::from_hex(KNOWN_KEY).unwrap();
        let b = PrivateKey::from_hex(&KNOWN_KEY[2..]).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn hex_roundtrip() {
        let key = PrivateKey::from_hex(KNOWN_KEY).unwrap();
        assert_eq!(key.to_hex().as_str(), &KNOWN_KEY[2..]);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(PrivateKey::from_hex("0x1234").is_err());
    }

    #[test]
    fn zero_scalar_rejected() {
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn non_hex_rejected() {
        let bad = "zz".repeat(32);
        assert!(PrivateKey::from_hex(&bad).is_err());
    }
}
