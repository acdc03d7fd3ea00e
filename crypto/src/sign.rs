//! EIP-191 personal-message signing and signer recovery.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use retrovote_types::Address;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use crate::address::address_from_verifying_key;
use crate::{CryptoError, PrivateKey};

/// A 65-byte `r || s || v` signature with `v` in `{27, 28}`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PersonalSignature([u8; 65]);

impl PersonalSignature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Recovery byte (`27` or `28`).
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// `0x`-prefixed lowercase hex, the form the login endpoint expects.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PersonalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonalSignature({})", self.to_hex())
    }
}

impl fmt::Display for PersonalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PersonalSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let mut bytes = [0u8; 65];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Keccak-256 of `"\x19Ethereum Signed Message:\n" || len(message) || message`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Sign `message` as an EIP-191 personal message.
///
/// Deterministic (RFC 6979) and normalized to low-s.
pub fn sign_personal_message(
    key: &PrivateKey,
    message: &[u8],
) -> Result<PersonalSignature, CryptoError> {
    let hash = personal_message_hash(message);
    let (signature, recovery_id) = key
        .signing_key()
        .sign_prehash_recoverable(&hash)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(PersonalSignature(out))
}

/// Recover the address that produced `signature` over `message`.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &PersonalSignature,
) -> Result<Address, CryptoError> {
    let hash = personal_message_hash(message);
    let bytes = signature.as_bytes();

    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = bytes[64]
        .checked_sub(27)
        .and_then(RecoveryId::from_byte)
        .ok_or_else(|| CryptoError::InvalidSignature(format!("bad recovery byte {}", bytes[64])))?;

    let key = VerifyingKey::recover_from_prehash(&hash, &sig, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(address_from_verifying_key(&key))
}
