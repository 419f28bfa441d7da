//! File-backed secret and account store
//!
//! Layout under the data directory:
//!
//! ```text
//! secrets/<hex(name)>.json              participant name and secret
//! accounts/<hex(name)>.json             multisig account
//! commitments/<fingerprint>-<digest>    signing package digest
//! default-account                       name of the first imported account
//! ```
//!
//! Every record is created with `create_new`, so concurrent writers of the
//! same name race on the filesystem and exactly one wins. Names are capped at
//! `MAX_NAME_LEN` bytes so the hex file name stays within filesystem limits.

use multisig_core::store::{
    account_exists, account_not_found, commitment_reused, key_package_in_use, secret_not_found,
    AccountStore, SecretStore,
};
use multisig_core::{Error, MultisigAccount, ParticipantIdentity, ParticipantSecret, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const SECRETS_DIR: &str = "secrets";
const ACCOUNTS_DIR: &str = "accounts";
const COMMITMENTS_DIR: &str = "commitments";
const DEFAULT_ACCOUNT_FILE: &str = "default-account";

/// Longest participant or account name, in bytes
pub const MAX_NAME_LEN: usize = 120;

#[derive(Serialize, Deserialize)]
struct StoredSecret {
    name: String,
    secret: ParticipantSecret,
}

/// Store rooted at a data directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store under `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [SECRETS_DIR, ACCOUNTS_DIR, COMMITMENTS_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(storage)?;
        }
        debug!(root = ?root, "file store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, dir: &str, name: &str) -> PathBuf {
        self.root.join(dir).join(format!("{}.json", hex::encode(name)))
    }

    fn read_records<T: for<'de> Deserialize<'de>>(&self, dir: &str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(self.root.join(dir)).map_err(storage)? {
            let path = entry.map_err(storage)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            records.push(read_json(&path)?);
        }
        Ok(records)
    }
}

impl SecretStore for FileStore {
    fn insert_secret(&self, name: &str, secret: ParticipantSecret) -> Result<()> {
        check_name_len(name)?;
        let record = StoredSecret {
            name: name.to_string(),
            secret,
        };
        let json = serde_json::to_vec_pretty(&record)?;
        match create_new(&self.record_path(SECRETS_DIR, name), &json) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::Validation(format!(
                "Participant with name {} already exists",
                name
            ))),
            result => result.map_err(storage),
        }
    }

    fn get_secret(&self, name: &str) -> Result<ParticipantSecret> {
        let path = self.record_path(SECRETS_DIR, name);
        if !path.exists() {
            return Err(secret_not_found(name));
        }
        let record: StoredSecret = read_json(&path)?;
        Ok(record.secret)
    }

    fn find_secret(&self, identity: &ParticipantIdentity) -> Result<Option<(String, ParticipantSecret)>> {
        Ok(self
            .read_records::<StoredSecret>(SECRETS_DIR)?
            .into_iter()
            .find(|record| &record.secret.to_identity() == identity)
            .map(|record| (record.name, record.secret)))
    }

    fn list_secrets(&self) -> Result<Vec<(String, ParticipantSecret)>> {
        let mut secrets: Vec<_> = self
            .read_records::<StoredSecret>(SECRETS_DIR)?
            .into_iter()
            .map(|record| (record.name, record.secret))
            .collect();
        secrets.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(secrets)
    }
}

impl AccountStore for FileStore {
    fn import_account(&self, account: MultisigAccount) -> Result<String> {
        let name = account.name.clone();
        check_name_len(&name)?;
        let path = self.record_path(ACCOUNTS_DIR, &name);
        if path.exists() {
            return Err(account_exists(&name));
        }
        if let Some(signer) = account.identity() {
            if let Some(existing) = self
                .read_records::<MultisigAccount>(ACCOUNTS_DIR)?
                .into_iter()
                .find(|existing| existing.shares_key_package_with(&account))
            {
                return Err(key_package_in_use(&existing.name, &signer));
            }
        }

        let json = serde_json::to_vec_pretty(&account)?;
        match create_new(&path, &json) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(account_exists(&name)),
            result => result.map_err(storage)?,
        }

        // First import wins
        match create_new(&self.root.join(DEFAULT_ACCOUNT_FILE), name.as_bytes()) {
            Err(e) if e.kind() != ErrorKind::AlreadyExists => return Err(storage(e)),
            _ => {}
        }
        Ok(name)
    }

    fn get_account(&self, name: &str) -> Result<MultisigAccount> {
        let path = self.record_path(ACCOUNTS_DIR, name);
        if !path.exists() {
            return Err(account_not_found(name));
        }
        read_json(&path)
    }

    fn default_account(&self) -> Result<MultisigAccount> {
        match fs::read_to_string(self.root.join(DEFAULT_ACCOUNT_FILE)) {
            Ok(name) => self.get_account(name.trim()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::NotFound("No default account is set".into()))
            }
            Err(e) => Err(storage(e)),
        }
    }

    fn list_accounts(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .read_records::<MultisigAccount>(ACCOUNTS_DIR)?
            .into_iter()
            .map(|account| account.name)
            .collect();
        names.sort();
        Ok(names)
    }

    fn record_commitment_use(
        &self,
        signer: &ParticipantIdentity,
        commitment: [u8; 32],
        package: [u8; 32],
    ) -> Result<()> {
        let path = self.root.join(COMMITMENTS_DIR).join(format!(
            "{}-{}",
            hex::encode(signer.fingerprint()),
            hex::encode(commitment)
        ));
        let package = hex::encode(package);

        match create_new(&path, package.as_bytes()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let recorded = fs::read_to_string(&path).map_err(storage)?;
                if recorded.trim() == package {
                    Ok(())
                } else {
                    Err(commitment_reused(signer))
                }
            }
            Err(e) => Err(storage(e)),
        }
    }
}

fn check_name_len(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "name must be at most {} bytes, got {}",
            MAX_NAME_LEN,
            name.len()
        )));
    }
    Ok(())
}

fn create_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file: File = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(storage)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Storage(format!("corrupt record {}: {}", path.display(), e)))
}

fn storage(e: io::Error) -> Error {
    Error::Storage(e.to_string())
}
