//! BIP-39 mnemonics and BIP-32 secp256k1 key derivation.
//!
//! The mnemonic is turned into a 64-byte seed (empty passphrase), the BIP-32
//! master key is derived from it with HMAC-SHA512 keyed by `"Bitcoin seed"`,
//! and child keys are walked along [`DEFAULT_DERIVATION_PATH`], the first
//! account of the standard EVM wallet layout.

use bip39::Mnemonic;
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{FieldBytes, Scalar};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::{CryptoError, PrivateKey};

type HmacSha512 = Hmac<Sha512>;

/// BIP-44 path of the first EVM account: m/44'/60'/0'/0/0
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// An extended private key: secret scalar plus chain code.
struct ExtendedKey {
    secret: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl ExtendedKey {
    fn master(seed: &[u8]) -> Result<Self, CryptoError> {
        let mut mac = HmacSha512::new_from_slice(b"Bitcoin seed")
            .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
        mac.update(seed);
        let out = mac.finalize().into_bytes();
        Self::from_hmac_output(&out, None)
    }

    fn child(&self, index: u32) -> Result<Self, CryptoError> {
        let mut mac = HmacSha512::new_from_slice(&self.chain_code[..])
            .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;

        if index >= HARDENED_OFFSET {
            mac.update(&[0u8]);
            mac.update(&self.secret[..]);
        } else {
            let key = PrivateKey::from_bytes(&self.secret)?;
            let point = key.verifying_key().as_affine().to_encoded_point(true);
            mac.update(point.as_bytes());
        }
        mac.update(&index.to_be_bytes());

        let out = mac.finalize().into_bytes();
        Self::from_hmac_output(&out, Some(&*self.secret))
    }

    /// Split `I = IL || IR`; the child secret is `IL + parent (mod n)`.
    fn from_hmac_output(out: &[u8], parent: Option<&[u8; 32]>) -> Result<Self, CryptoError> {
        let tweak = parse_scalar(&out[..32])?;
        let scalar = match parent {
            Some(parent) => tweak + parse_scalar(parent)?,
            None => tweak,
        };
        if bool::from(Field::is_zero(&scalar)) {
            return Err(CryptoError::DerivationFailed("derived key is zero".into()));
        }

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&scalar.to_repr());
        let mut chain_code = Zeroizing::new([0u8; 32]);
        chain_code.copy_from_slice(&out[32..64]);
        Ok(Self { secret, chain_code })
    }
}

fn parse_scalar(bytes: &[u8]) -> Result<Scalar, CryptoError> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
        .ok_or_else(|| CryptoError::DerivationFailed("scalar not below curve order".into()))
}

/// Parse `m/44'/60'/0'/0/0` style paths into child indices.
fn parse_path(path: &str) -> Result<Vec<u32>, CryptoError> {
    let mut parts = path.split('/');
    if parts.next() != Some("m") {
        return Err(CryptoError::DerivationFailed(format!(
            "derivation path must start with m/: {path}"
        )));
    }
    parts
        .map(|part| {
            let (digits, hardened) = match part.strip_suffix('\'') {
                Some(d) => (d, true),
                None => (part, false),
            };
            let index: u32 = digits.parse().map_err(|_| {
                CryptoError::DerivationFailed(format!("bad path component: {part}"))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(CryptoError::DerivationFailed(format!(
                    "path component out of range: {part}"
                )));
            }
            Ok(if hardened { index + HARDENED_OFFSET } else { index })
        })
        .collect()
}

/// Derive the private key at `path` from a BIP-39 phrase (empty passphrase).
pub fn private_key_from_mnemonic(phrase: &str, path: &str) -> Result<PrivateKey, CryptoError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));

    let mut key = ExtendedKey::master(&seed[..])?;
    for index in parse_path(path)? {
        key = key.child(index)?;
    }
    PrivateKey::from_bytes(&key.secret)
}

/// Whether `phrase` is a valid BIP-39 mnemonic (English word list, valid checksum).
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}
