//! Address derivation from public keys.
//!
//! Address = last 20 bytes of Keccak-256(uncompressed public key without the 0x04 tag).

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use retrovote_types::Address;
use sha3::{Digest, Keccak256};

/// Derive the account address for a secp256k1 public key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..32]);
    Address::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrivateKey;

    #[test]
    fn private_key_one_maps_to_known_address() {
        let mut raw = [0u8; 32];
        raw[31] = 1;
        let key = PrivateKey::from_bytes(&raw).unwrap();
        assert_eq!(
            address_from_verifying_key(key.verifying_key()).to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }
}
