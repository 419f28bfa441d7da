//! In-memory store implementation

use super::{
    account_exists, account_not_found, commitment_reused, key_package_in_use, secret_not_found,
    AccountStore, SecretStore,
};
use crate::account::MultisigAccount;
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// DashMap-backed secret and account store
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Participant secrets: name -> secret
    secrets: Arc<DashMap<String, ParticipantSecret>>,
    /// Accounts: name -> account
    accounts: Arc<DashMap<String, MultisigAccount>>,
    /// Commitment ledger: (signer, commitment digest) -> signing package digest
    commitments: Arc<DashMap<(ParticipantIdentity, [u8; 32]), [u8; 32]>>,
    /// Name of the first imported account
    default_account: Arc<OnceLock<String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Insert without the name and key package checks of `import_account`
    pub(crate) fn insert_account_unchecked(&self, account: MultisigAccount) {
        self.accounts.insert(account.name.clone(), account);
    }
}

impl SecretStore for MemoryStore {
    fn insert_secret(&self, name: &str, secret: ParticipantSecret) -> Result<()> {
        match self.secrets.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::Validation(format!(
                "Participant with name {} already exists",
                name
            ))),
            Entry::Vacant(entry) => {
                entry.insert(secret);
                Ok(())
            }
        }
    }

    fn get_secret(&self, name: &str) -> Result<ParticipantSecret> {
        self.secrets
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| secret_not_found(name))
    }

    fn find_secret(&self, identity: &ParticipantIdentity) -> Result<Option<(String, ParticipantSecret)>> {
        Ok(self
            .secrets
            .iter()
            .find(|entry| &entry.value().to_identity() == identity)
            .map(|entry| (entry.key().clone(), entry.value().clone())))
    }

    fn list_secrets(&self) -> Result<Vec<(String, ParticipantSecret)>> {
        let mut secrets: Vec<_> = self
            .secrets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        secrets.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(secrets)
    }
}

impl AccountStore for MemoryStore {
    fn import_account(&self, account: MultisigAccount) -> Result<String> {
        let name = account.name.clone();
        if self.accounts.contains_key(&name) {
            return Err(account_exists(&name));
        }
        if let Some(signer) = account.identity() {
            if let Some(existing) = self
                .accounts
                .iter()
                .find(|entry| entry.value().shares_key_package_with(&account))
            {
                return Err(key_package_in_use(existing.key(), &signer));
            }
        }

        match self.accounts.entry(name.clone()) {
            Entry::Occupied(_) => return Err(account_exists(&name)),
            Entry::Vacant(entry) => {
                entry.insert(account);
            }
        }

        let _ = self.default_account.set(name.clone());
        Ok(name)
    }

    fn get_account(&self, name: &str) -> Result<MultisigAccount> {
        self.accounts
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| account_not_found(name))
    }

    fn default_account(&self) -> Result<MultisigAccount> {
        let name = self
            .default_account
            .get()
            .ok_or_else(|| Error::NotFound("No default account is set".into()))?;
        self.get_account(name)
    }

    fn list_accounts(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.accounts.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn record_commitment_use(
        &self,
        signer: &ParticipantIdentity,
        commitment: [u8; 32],
        package: [u8; 32],
    ) -> Result<()> {
        match self.commitments.entry((signer.clone(), commitment)) {
            Entry::Occupied(entry) if *entry.get() != package => Err(commitment_reused(signer)),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(package);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_insert_and_get() {
        let store = MemoryStore::new();
        let secret = ParticipantSecret::random();
        let identity = secret.to_identity();

        store.insert_secret("secret-0", secret).unwrap();

        assert_eq!(store.get_secret("secret-0").unwrap().to_identity(), identity);
        let (name, _) = store.find_secret(&identity).unwrap().unwrap();
        assert_eq!(name, "secret-0");
    }

    #[test]
    fn test_duplicate_secret_rejected() {
        let store = MemoryStore::new();
        store.insert_secret("secret-0", ParticipantSecret::random()).unwrap();

        let err = store
            .insert_secret("secret-0", ParticipantSecret::random())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_names() {
        let store = MemoryStore::new();

        let err = store.get_secret("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "No participant found with name missing");

        let err = store.get_account("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(store.default_account(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_secrets_sorted() {
        let store = MemoryStore::new();
        store.insert_secret("b", ParticipantSecret::random()).unwrap();
        store.insert_secret("a", ParticipantSecret::random()).unwrap();

        let names: Vec<String> = store.list_secrets().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_commitment_ledger() {
        let store = MemoryStore::new();

        let signer = ParticipantSecret::random().to_identity();
        let other = ParticipantSecret::random().to_identity();

        store.record_commitment_use(&signer, [1; 32], [2; 32]).unwrap();
        store.record_commitment_use(&signer, [1; 32], [2; 32]).unwrap();
        store.record_commitment_use(&other, [1; 32], [3; 32]).unwrap();

        let err = store.record_commitment_use(&signer, [1; 32], [3; 32]).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_concurrent_inserts_of_distinct_names() {
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    store
                        .insert_secret(&format!("secret-{}", i), ParticipantSecret::random())
                        .unwrap();
                });
            }
        });
        assert_eq!(store.list_secrets().unwrap().len(), 8);
    }
}
