//! DKG round 3: key package, group secret key and signer account

use super::packages::{Round1PublicPackage, Round2PublicPackage, Round2SecretPackage};
use super::round2::collect_round1_packages;
use crate::account::{AccountRole, MultisigAccount, MultisigGroup};
use crate::encoding::FrostCodec;
use crate::envelope::Purpose;
use crate::keys::{derive_account_keys, GroupSecretKey};
use crate::participant::ParticipantIdentity;
use crate::store::{AccountStore, SecretStore};
use crate::types::{AccountHead, GroupConfig};
use crate::{Error, Result};
use frost_ed25519 as frost;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

/// Finish DKG for the participant stored under `participant_name` and import
/// the resulting signer account as `account_name`
#[instrument(skip(store, round2_secret_package, round1_public_packages, round2_public_packages))]
pub fn round3<S: SecretStore + AccountStore + ?Sized>(
    store: &S,
    participant_name: &str,
    account_name: &str,
    round2_secret_package: &Round2SecretPackage,
    round1_public_packages: &[Round1PublicPackage],
    round2_public_packages: &[Round2PublicPackage],
    account_created_at: Option<AccountHead>,
) -> Result<MultisigAccount> {
    let secret = store.get_secret(participant_name)?;
    let identity = secret.to_identity();
    let state = round2_secret_package.open(&secret)?;
    let config = state.config()?;

    let round1 = collect_round1_packages(&identity, &config, round1_public_packages)?;
    let round2 = collect_round2_packages(&identity, &config, round2_public_packages)?;

    let mut round1_frost = BTreeMap::new();
    for (sender, package) in round1.iter().filter(|(sender, _)| **sender != identity) {
        round1_frost.insert(sender.frost_identifier()?, package.frost_package.clone());
    }

    debug!(identity = identity.short(), "DKG round 3: decrypting shares");
    let mut round2_frost = BTreeMap::new();
    for (sender, package) in &round2 {
        let plaintext = package.share.open(&secret, Purpose::Round2Share)?;
        let share = frost::keys::dkg::round2::Package::decode(&plaintext)?;
        round2_frost.insert(sender.frost_identifier()?, share);
    }

    let round2_secret = frost::keys::dkg::round2::SecretPackage::deserialize(state.frost_secret())
        .map_err(|e| Error::Deserialization(format!("round 2 secret package: {}", e)))?;
    let (key_package, public_key_package) =
        frost::keys::dkg::part3(&round2_secret, &round1_frost, &round2_frost)?;

    let mut shards = BTreeMap::new();
    for (sender, package) in &round1 {
        let envelope = package.shard_for(&identity).ok_or_else(|| {
            Error::Validation(format!(
                "Round 1 public package from {} carries no group secret key shard for {}",
                sender, identity
            ))
        })?;
        let plaintext = envelope.open(&secret, Purpose::GroupKeyShard)?;
        let shard: [u8; 32] = plaintext.as_slice().try_into().map_err(|_| {
            Error::Deserialization(format!("group secret key shard from {}", sender))
        })?;
        shards.insert(sender.clone(), shard);
    }
    let group_secret_key = GroupSecretKey::from_shards(&shards);

    let keys = derive_account_keys(Some(&key_package), &public_key_package, &group_secret_key)?;
    let account = MultisigAccount::new(
        account_name,
        keys,
        MultisigGroup {
            min_signers: config.min_signers(),
            participants: config.participants().to_vec(),
            public_key_package,
        },
        AccountRole::Signer {
            secret,
            key_package,
        },
        account_created_at,
    )?;
    store.import_account(account.clone())?;

    info!(
        identity = identity.short(),
        account = account_name,
        public_address = account.keys.public_address_hex(),
        "DKG round 3 complete"
    );
    Ok(account)
}

/// Validate the round 2 packages addressed to `identity`, keyed by sender
fn collect_round2_packages<'a>(
    identity: &ParticipantIdentity,
    config: &GroupConfig,
    packages: &'a [Round2PublicPackage],
) -> Result<BTreeMap<ParticipantIdentity, &'a Round2PublicPackage>> {
    let expected = config.participants().len() - 1;
    if packages.len() != expected {
        return Err(Error::Validation(format!(
            "invalid input: expected {} round 2 public packages, got {}",
            expected,
            packages.len()
        )));
    }

    let checksum = config.checksum();
    let mut collected = BTreeMap::new();
    for package in packages {
        if package.recipient() != identity {
            warn!(
                sender = package.sender.short(),
                recipient = package.recipient().short(),
                "round 2 package addressed to another participant"
            );
            return Err(Error::Validation(format!(
                "Round 2 public package from {} is addressed to {}, not {}",
                package.sender,
                package.recipient(),
                identity
            )));
        }
        if !bool::from(package.group_checksum[..].ct_eq(&checksum[..])) {
            return Err(Error::Validation(format!(
                "Round 2 public package from {} was created for a different group",
                package.sender
            )));
        }
        if package.sender == *identity || !config.contains(&package.sender) {
            return Err(Error::Validation(format!(
                "Round 2 public package from {} is not from another group participant",
                package.sender
            )));
        }
        if collected.insert(package.sender.clone(), package).is_some() {
            return Err(Error::Validation(format!(
                "Duplicate round 2 public package from {}",
                package.sender
            )));
        }
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::{round1, round2, Round1Output, Round2Output};
    use crate::participant::ParticipantSecret;
    use crate::store::MemoryStore;

    struct Dkg {
        store: MemoryStore,
        round1: Vec<Round1Output>,
        round2: Vec<Round2Output>,
    }

    impl Dkg {
        fn run(n: usize, min_signers: u16) -> Self {
            let store = MemoryStore::new();
            let mut identities = Vec::new();
            for i in 0..n {
                let secret = ParticipantSecret::random();
                identities.push(secret.to_identity());
                store.insert_secret(&format!("secret-{}", i), secret).unwrap();
            }
            let config = GroupConfig::new(min_signers, identities).unwrap();

            let round1: Vec<_> = (0..n)
                .map(|i| round1(&store, &format!("secret-{}", i), &config).unwrap())
                .collect();
            let public: Vec<_> = round1.iter().map(|o| o.public_package.clone()).collect();
            let round2 = (0..n)
                .map(|i| {
                    round2(&store, &format!("secret-{}", i), &round1[i].secret_package, &public)
                        .unwrap()
                })
                .collect();

            Self {
                store,
                round1,
                round2,
            }
        }

        fn round1_public(&self) -> Vec<Round1PublicPackage> {
            self.round1.iter().map(|o| o.public_package.clone()).collect()
        }

        /// Round 2 packages addressed to participant `i`
        fn round2_for(&self, i: usize) -> Vec<Round2PublicPackage> {
            let identity = self.store.get_secret(&format!("secret-{}", i)).unwrap().to_identity();
            self.round2
                .iter()
                .flat_map(|o| o.public_packages.iter())
                .filter(|p| p.recipient() == &identity)
                .cloned()
                .collect()
        }

        fn finish(&self, i: usize) -> Result<MultisigAccount> {
            round3(
                &self.store,
                &format!("secret-{}", i),
                &format!("account-{}", i),
                &self.round2[i].secret_package,
                &self.round1_public(),
                &self.round2_for(i),
                None,
            )
        }
    }

    #[test]
    fn test_round3_all_participants_agree() {
        let dkg = Dkg::run(3, 2);
        let accounts: Vec<_> = (0..3).map(|i| dkg.finish(i).unwrap()).collect();

        for account in &accounts[1..] {
            assert_eq!(account.keys, accounts[0].keys);
            assert_eq!(account.group, accounts[0].group);
        }
        assert!(accounts.iter().all(|a| a.is_signer()));
        assert_eq!(dkg.store.list_accounts().unwrap().len(), 3);
    }

    #[test]
    fn test_round3_retry_under_new_name_rejected() {
        let dkg = Dkg::run(2, 2);
        dkg.finish(0).unwrap();

        let err = round3(
            &dkg.store,
            "secret-0",
            "account-0-retry",
            &dkg.round2[0].secret_package,
            &dkg.round1_public(),
            &dkg.round2_for(0),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("already holds the key package"));
        assert_eq!(dkg.store.list_accounts().unwrap(), vec!["account-0"]);
    }

    #[test]
    fn test_round3_foreign_secret_package() {
        let dkg = Dkg::run(3, 2);
        let err = round3(
            &dkg.store,
            "secret-0",
            "account-0",
            &dkg.round2[1].secret_package,
            &dkg.round1_public(),
            &dkg.round2_for(0),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Decryption(_)));
        assert!(err.to_string().starts_with("decryption error"));
    }

    #[test]
    fn test_round3_wrong_round2_count() {
        let dkg = Dkg::run(3, 2);
        let mut packages = dkg.round2_for(0);
        packages.pop();

        let err = round3(
            &dkg.store,
            "secret-0",
            "account-0",
            &dkg.round2[0].secret_package,
            &dkg.round1_public(),
            &packages,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: expected 2 round 2 public packages, got 1"
        );
    }

    #[test]
    fn test_round3_wrong_round1_count() {
        let dkg = Dkg::run(3, 2);
        let mut packages = dkg.round1_public();
        packages.pop();

        let err = round3(
            &dkg.store,
            "secret-0",
            "account-0",
            &dkg.round2[0].secret_package,
            &packages,
            &dkg.round2_for(0),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: expected 3 round 1 public packages, got 2"
        );
    }

    #[test]
    fn test_round3_misaddressed_package() {
        let dkg = Dkg::run(3, 2);
        let mut packages = dkg.round2_for(0);
        packages[0] = dkg.round2_for(1)[0].clone();

        let err = round3(
            &dkg.store,
            "secret-0",
            "account-0",
            &dkg.round2[0].secret_package,
            &dkg.round1_public(),
            &packages,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("is addressed to"));
    }

    #[test]
    fn test_round3_records_created_at() {
        let dkg = Dkg::run(2, 2);
        let head = AccountHead {
            sequence: 42,
            hash: "ab".repeat(32),
        };
        let account = round3(
            &dkg.store,
            "secret-1",
            "account-1",
            &dkg.round2[1].secret_package,
            &dkg.round1_public(),
            &dkg.round2_for(1),
            Some(head.clone()),
        )
        .unwrap();

        assert_eq!(account.created_at, Some(head));
        assert_eq!(dkg.store.get_account("account-1").unwrap().id, account.id);
    }
}
