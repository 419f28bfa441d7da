//! Shared setup for the integration tests

#![allow(dead_code)]

use multisig_core::dealer::create_trusted_dealer_key_package;
use multisig_core::keygen::{round1, round2, round3, Round2PublicPackage};
use multisig_core::sign::{
    create_signature_share, create_signing_commitment, create_signing_package, SignatureShare,
    SigningCommitment, SigningPackage,
};
use multisig_core::store::{AccountStore, MemoryStore, SecretStore};
use multisig_core::{
    GroupConfig, MultisigAccount, ParticipantIdentity, ParticipantSecret, RawTransactionCodec,
};
use tracing_subscriber::EnvFilter;

/// Route logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn secret_name(i: usize) -> String {
    format!("secret-{}", i)
}

pub fn account_name(i: usize) -> String {
    format!("account-{}", i)
}

/// Store with `n` participant secrets named `secret-{i}`
pub fn participants(n: usize) -> (MemoryStore, Vec<ParticipantIdentity>) {
    init_tracing();
    let store = MemoryStore::new();
    let identities = (0..n)
        .map(|i| {
            let secret = ParticipantSecret::random();
            let identity = secret.to_identity();
            store.insert_secret(&secret_name(i), secret).unwrap();
            identity
        })
        .collect();
    (store, identities)
}

/// Trusted dealer setup importing `account-{i}` for every participant and a `coordinator`
pub fn dealer_group(n: usize, min_signers: u16) -> (MemoryStore, Vec<ParticipantIdentity>) {
    let (store, identities) = participants(n);
    let config = GroupConfig::new(min_signers, identities.clone()).unwrap();
    let packages = create_trusted_dealer_key_package(&config).unwrap();

    for (identity, import) in packages.participant_imports() {
        let (name, secret) = store.find_secret(&identity).unwrap().unwrap();
        let i: usize = name.trim_start_matches("secret-").parse().unwrap();
        let account = import
            .into_account(Some(&account_name(i)), Some(secret), None)
            .unwrap();
        store.import_account(account).unwrap();
    }
    let coordinator = packages
        .coordinator_import()
        .into_account(Some("coordinator"), None, None)
        .unwrap();
    store.import_account(coordinator).unwrap();
    (store, identities)
}

/// Full DKG run; every participant imports `account-{i}`
pub fn dkg_group(n: usize, min_signers: u16) -> (MemoryStore, Vec<ParticipantIdentity>, Vec<MultisigAccount>) {
    let (store, identities) = participants(n);
    let config = GroupConfig::new(min_signers, identities.clone()).unwrap();

    let round1_outputs: Vec<_> = (0..n)
        .map(|i| round1(&store, &secret_name(i), &config).unwrap())
        .collect();
    let round1_public: Vec<_> = round1_outputs
        .iter()
        .map(|o| o.public_package.clone())
        .collect();

    let round2_outputs: Vec<_> = (0..n)
        .map(|i| {
            round2(
                &store,
                &secret_name(i),
                &round1_outputs[i].secret_package,
                &round1_public,
            )
            .unwrap()
        })
        .collect();
    let round2_public: Vec<Round2PublicPackage> = round2_outputs
        .iter()
        .flat_map(|o| o.public_packages.iter().cloned())
        .collect();

    let accounts = (0..n)
        .map(|i| {
            let addressed: Vec<_> = round2_public
                .iter()
                .filter(|p| p.recipient() == &identities[i])
                .cloned()
                .collect();
            round3(
                &store,
                &secret_name(i),
                &account_name(i),
                &round2_outputs[i].secret_package,
                &round1_public,
                &addressed,
                None,
            )
            .unwrap()
        })
        .collect();
    (store, identities, accounts)
}

/// Commitments of `signers` (participant indices) for `tx`
pub fn commitments(
    store: &MemoryStore,
    identities: &[ParticipantIdentity],
    signers: &[usize],
    tx: &[u8],
) -> Vec<SigningCommitment> {
    let signer_set: Vec<_> = signers.iter().map(|&i| identities[i].clone()).collect();
    signers
        .iter()
        .map(|&i| {
            create_signing_commitment(
                store,
                &RawTransactionCodec,
                &account_name(i),
                tx,
                &signer_set,
                None,
            )
            .unwrap()
        })
        .collect()
}

/// Signing package built by `account`
pub fn signing_package(
    store: &MemoryStore,
    account: &str,
    commitments: &[SigningCommitment],
    tx: &[u8],
) -> SigningPackage {
    create_signing_package(store, &RawTransactionCodec, Some(account), commitments, tx).unwrap()
}

pub fn signature_shares(store: &MemoryStore, signers: &[usize], package: &SigningPackage) -> Vec<SignatureShare> {
    signers
        .iter()
        .map(|&i| create_signature_share(store, &RawTransactionCodec, &account_name(i), package).unwrap())
        .collect()
}
