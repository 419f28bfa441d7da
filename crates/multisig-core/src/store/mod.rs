//! Identity & secret store and account store
//!
//! Every operation receives its store explicitly. Implementations serialize
//! writes per key; distinct names never contend.

use crate::account::MultisigAccount;
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::Result;

/// Participant secrets keyed by a caller-chosen name
pub trait SecretStore: Send + Sync {
    /// Store a new secret; an existing name is a validation error
    fn insert_secret(&self, name: &str, secret: ParticipantSecret) -> Result<()>;

    /// Look up a secret by name
    fn get_secret(&self, name: &str) -> Result<ParticipantSecret>;

    /// Find the secret behind an identity
    fn find_secret(&self, identity: &ParticipantIdentity) -> Result<Option<(String, ParticipantSecret)>>;

    /// All stored participants, ordered by name
    fn list_secrets(&self) -> Result<Vec<(String, ParticipantSecret)>>;
}

/// Multisig accounts keyed by name
pub trait AccountStore: Send + Sync {
    /// Import an account, returning its name
    ///
    /// An existing name, or a signer whose key package another account
    /// already holds, is a validation error.
    fn import_account(&self, account: MultisigAccount) -> Result<String>;

    /// Look up an account by name
    fn get_account(&self, name: &str) -> Result<MultisigAccount>;

    /// The first imported account
    fn default_account(&self) -> Result<MultisigAccount>;

    /// Names of all accounts
    fn list_accounts(&self) -> Result<Vec<String>>;

    /// Bind a signer's commitment to the signing package it was used for
    ///
    /// Entries are keyed by signer identity, so every account holding the
    /// same key package shares one ledger. Entries are never pruned: a
    /// finished package can still be replayed to a signer, and a dropped
    /// entry would let the same nonces sign a second package.
    ///
    /// Repeating the same pair succeeds; the same commitment with a different
    /// package is a consistency error.
    fn record_commitment_use(
        &self,
        signer: &ParticipantIdentity,
        commitment: [u8; 32],
        package: [u8; 32],
    ) -> Result<()>;
}

/// Account lookup honouring an optional name
pub fn resolve_account<S: AccountStore + ?Sized>(store: &S, name: Option<&str>) -> Result<MultisigAccount> {
    match name {
        Some(name) => store.get_account(name),
        None => store.default_account(),
    }
}

pub fn secret_not_found(name: &str) -> crate::Error {
    crate::Error::NotFound(format!("No participant found with name {}", name))
}

pub fn account_not_found(name: &str) -> crate::Error {
    crate::Error::NotFound(format!("No account with name {}", name))
}

pub fn commitment_reused(signer: &ParticipantIdentity) -> crate::Error {
    crate::Error::Consistency(format!(
        "Signing commitment of identity {} was already used for a different signing package",
        signer
    ))
}

pub fn account_exists(name: &str) -> crate::Error {
    crate::Error::Validation(format!("Account already exists with the name {}", name))
}

/// A second account for an already imported key package
pub fn key_package_in_use(existing: &str, signer: &ParticipantIdentity) -> crate::Error {
    crate::Error::Validation(format!(
        "Account {} already holds the key package of identity {} for this group",
        existing, signer
    ))
}

/// In-memory store for tests and embedding
pub mod memory;

pub use memory::MemoryStore;
