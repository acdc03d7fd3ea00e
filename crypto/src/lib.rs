//! Account key material for retrovote.
//!
//! - **secp256k1** signing keys (via `k256`)
//! - **BIP-39** mnemonics with **BIP-32** derivation at `m/44'/60'/0'/0/0`
//! - EVM address derivation (Keccak-256 of the uncompressed public key)
//! - **EIP-191** personal-message signatures with recovery byte
//! - Account-set loading from mixed mnemonic / private-key input

pub mod account;
pub mod address;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use account::{load_accounts, Account, AccountSet, RejectedLine};
pub use address::address_from_verifying_key;
pub use error::CryptoError;
pub use keys::PrivateKey;
pub use mnemonic::{private_key_from_mnemonic, validate_mnemonic, DEFAULT_DERIVATION_PATH};
pub use sign::{personal_message_hash, recover_personal_signer, sign_personal_message, PersonalSignature};
