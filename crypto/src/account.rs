//! Accounts: an address plus the key that controls it.
//!
//! Accounts are built once at startup from secret material (one mnemonic or
//! private key per line) and are immutable afterwards. Each account is moved
//! into exactly one worker; nothing here is shared between workers.

use retrovote_types::Address;
use std::collections::HashSet;
use std::fmt;
use zeroize::Zeroizing;

use crate::mnemonic::{private_key_from_mnemonic, validate_mnemonic, DEFAULT_DERIVATION_PATH};
use crate::sign::{sign_personal_message, PersonalSignature};
use crate::{CryptoError, PrivateKey};

pub struct Account {
    key: PrivateKey,
    address: Address,
}

impl Account {
    pub fn new(key: PrivateKey) -> Self {
        let address = key.address();
        Self { key, address }
    }

    /// Build an account from either a BIP-39 phrase or a hex private key.
    ///
    /// The mnemonic interpretation is tried first.
    pub fn from_secret(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        if validate_mnemonic(trimmed) {
            let key = private_key_from_mnemonic(trimmed, DEFAULT_DERIVATION_PATH)?;
            return Ok(Self::new(key));
        }
        PrivateKey::from_hex(trimmed).map(Self::new)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a server challenge as an EIP-191 personal message.
    pub fn sign_challenge(&self, challenge: &str) -> Result<PersonalSignature, CryptoError> {
        sign_personal_message(&self.key, challenge.as_bytes())
    }

    /// Hex private key, used when exporting eligible accounts.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        self.key.to_hex()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// An input line that could not be turned into an account.
#[derive(Debug)]
pub struct RejectedLine {
    /// 1-based line number in the source.
    pub line: usize,
    pub reason: String,
}

/// The validated, de-duplicated set of accounts for a run.
#[derive(Debug, Default)]
pub struct AccountSet {
    accounts: Vec<Account>,
}

impl AccountSet {
    /// Parse secret material, one entry per line. Blank lines are skipped.
    ///
    /// Returns the accounts that parsed plus the lines that did not. Duplicate
    /// addresses keep their first occurrence and report the rest as rejected.
    pub fn parse<'a, I>(lines: I) -> (Self, Vec<RejectedLine>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut accounts = Vec::new();
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for (idx, raw) in lines.into_iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match Account::from_secret(line) {
                Ok(account) => {
                    if seen.insert(account.address()) {
                        accounts.push(account);
                    } else {
                        rejected.push(RejectedLine {
                            line: idx + 1,
                            reason: format!("duplicate of {}", account.address()),
                        });
                    }
                }
                Err(e) => rejected.push(RejectedLine {
                    line: idx + 1,
                    reason: format!("not a valid mnemonic or private key: {e}"),
                }),
            }
        }

        (Self { accounts }, rejected)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.accounts.iter().map(Account::address).collect()
    }

    pub fn into_accounts(self) -> Vec<Account> {
        self.accounts
    }
}

impl From<Vec<Account>> for AccountSet {
    fn from(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

/// Parse an account list, logging every rejected line by number (never its content).
pub fn load_accounts<'a, I>(lines: I) -> AccountSet
where
    I: IntoIterator<Item = &'a str>,
{
    let (set, rejected) = AccountSet::parse(lines);
    for r in &rejected {
        tracing::warn!("accounts line {} skipped: {}", r.line, r.reason);
    }
    set
}
