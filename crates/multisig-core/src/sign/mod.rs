//! Threshold signing module
//!
//! Commitment generation, signing package construction, signature shares and
//! aggregation. Every step is a function of its inputs plus store lookups; the
//! coordinator moves commitments, packages and shares between signers.

mod aggregate;
mod commitment;
mod package;
mod share;

pub use aggregate::{aggregate_signature_shares, verify_signature, SignedTransaction};
pub use commitment::{create_signing_commitment, signers_checksum, SigningCommitment};
pub use package::{create_signing_package, SigningPackage};
pub use share::{create_signature_share, SignatureShare};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dealer::create_trusted_dealer_key_package;
    use crate::participant::{ParticipantIdentity, ParticipantSecret};
    use crate::store::{AccountStore, MemoryStore};
    use crate::transaction::RawTransactionCodec;
    use crate::types::GroupConfig;
    use crate::Error;

    const TX: &[u8] = b"unsigned transaction";

    /// Dealer group with accounts `account-{i}` and `coordinator`
    fn group(n: usize, min_signers: u16) -> (MemoryStore, Vec<ParticipantIdentity>) {
        let secrets: Vec<_> = (0..n).map(|_| ParticipantSecret::random()).collect();
        let identities: Vec<_> = secrets.iter().map(|s| s.to_identity()).collect();
        let config = GroupConfig::new(min_signers, identities.clone()).unwrap();
        let packages = create_trusted_dealer_key_package(&config).unwrap();

        let store = MemoryStore::new();
        let coordinator = packages
            .coordinator_import()
            .into_account(Some("coordinator"), None, None)
            .unwrap();
        store.import_account(coordinator).unwrap();
        for (i, ((_, import), secret)) in packages
            .participant_imports()
            .into_iter()
            .zip(secrets)
            .enumerate()
        {
            let account = import
                .into_account(Some(&format!("account-{}", i)), Some(secret), None)
                .unwrap();
            store.import_account(account).unwrap();
        }
        (store, identities)
    }

    fn commit(
        store: &MemoryStore,
        signers: &[usize],
        identities: &[ParticipantIdentity],
        tx: &[u8],
    ) -> Vec<SigningCommitment> {
        let signer_set: Vec<_> = signers.iter().map(|&i| identities[i].clone()).collect();
        signers
            .iter()
            .map(|i| {
                create_signing_commitment(
                    store,
                    &RawTransactionCodec,
                    &format!("account-{}", i),
                    tx,
                    &signer_set,
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    fn shares(store: &MemoryStore, signers: &[usize], package: &SigningPackage) -> Vec<SignatureShare> {
        signers
            .iter()
            .map(|i| {
                create_signature_share(store, &RawTransactionCodec, &format!("account-{}", i), package)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_two_of_three_signing() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 2], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();
        let shares = shares(&store, &[0, 2], &package);

        let signed =
            aggregate_signature_shares(&store, &RawTransactionCodec, "coordinator", &package, &shares)
                .unwrap();

        let coordinator = store.get_account("coordinator").unwrap();
        verify_signature(&RawTransactionCodec, &coordinator, &signed.transaction).unwrap();
        assert_eq!(&signed.transaction[..TX.len()], TX);
        assert_eq!(&signed.transaction[TX.len()..], &signed.signature[..]);
    }

    #[test]
    fn test_signer_account_can_aggregate() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("account-0"), &commitments, TX)
                .unwrap();
        let shares = shares(&store, &[0, 1], &package);

        assert!(
            aggregate_signature_shares(&store, &RawTransactionCodec, "account-1", &package, &shares)
                .is_ok()
        );
    }

    #[test]
    fn test_package_below_threshold() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);

        let err = create_signing_package(
            &store,
            &RawTransactionCodec,
            Some("coordinator"),
            &commitments[..1],
            TX,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            err.to_string(),
            "A minimum of 2 signers is required for a valid signature. Only 1 commitments provided"
        );
    }

    #[test]
    fn test_package_default_account() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[1, 2], &identities, TX);
        assert!(create_signing_package(&store, &RawTransactionCodec, None, &commitments, TX).is_ok());

        let empty = MemoryStore::new();
        let err = create_signing_package(&empty, &RawTransactionCodec, None, &commitments, TX).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_package_rejects_foreign_identity() {
        let (store, identities) = group(3, 2);
        let (other_store, other_identities) = group(3, 2);

        let mut commitments = commit(&store, &[0, 1], &identities, TX);
        commitments[1] = commit(&other_store, &[0, 1], &other_identities, TX).remove(0);

        let err = create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
            .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "Commitment 2 is from identity {}, which is not part of the multisig group for account coordinator",
                other_identities[0]
            )
        );
    }

    #[test]
    fn test_package_rejects_duplicate_commitments() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let duplicated = vec![commitments[0].clone(), commitments[0].clone()];

        let err = create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &duplicated, TX)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_package_rejects_other_transaction() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, b"transaction a");

        let err = create_signing_package(
            &store,
            &RawTransactionCodec,
            Some("coordinator"),
            &commitments,
            b"transaction b",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
        assert_eq!(
            err.to_string(),
            "Commitment 1 was not generated for the given unsigned transaction and signer set"
        );
    }

    #[test]
    fn test_package_rejects_other_signer_set() {
        let (store, identities) = group(3, 2);
        let mut commitments = commit(&store, &[0, 1], &identities, TX);
        commitments.push(commit(&store, &[1, 2], &identities, TX).remove(1));

        let err = create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
            .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
        assert!(err.to_string().contains("was not generated for the given unsigned transaction"));
    }

    #[test]
    fn test_share_requires_signer_in_package() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();

        let err = create_signature_share(&store, &RawTransactionCodec, "account-2", &package).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = create_signature_share(&store, &RawTransactionCodec, "coordinator", &package).unwrap_err();
        assert_eq!(err.to_string(), "Account coordinator is not a multisig signer account");
    }

    #[test]
    fn test_share_is_repeatable_for_same_package() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();

        let a = create_signature_share(&store, &RawTransactionCodec, "account-0", &package).unwrap();
        let b = create_signature_share(&store, &RawTransactionCodec, "account-0", &package).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_commitment_cannot_sign_two_packages() {
        let (store, identities) = group(3, 2);
        let first = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &first, TX).unwrap();
        create_signature_share(&store, &RawTransactionCodec, "account-0", &package).unwrap();

        let second = vec![first[0].clone(), commit(&store, &[0, 1], &identities, TX).remove(1)];
        let other_package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &second, TX).unwrap();

        let err =
            create_signature_share(&store, &RawTransactionCodec, "account-0", &other_package).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_same_key_package_cannot_be_imported_twice() {
        let (store, _) = group(3, 2);
        let original = store.get_account("account-0").unwrap();
        let (secret, _) = original.signer().unwrap();

        let again = original
            .to_import()
            .into_account(Some("account-0-again"), Some(secret.clone()), None)
            .unwrap();
        let err = store.import_account(again).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "Account account-0 already holds the key package of identity {} for this group",
                secret.to_identity()
            )
        );
    }

    #[test]
    fn test_commitment_ledger_is_shared_across_account_names() {
        let (store, identities) = group(3, 2);
        let original = store.get_account("account-0").unwrap();
        let (secret, _) = original.signer().unwrap();
        let again = original
            .to_import()
            .into_account(Some("account-0-again"), Some(secret.clone()), None)
            .unwrap();
        store.insert_account_unchecked(again);

        let first = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &first, TX).unwrap();
        create_signature_share(&store, &RawTransactionCodec, "account-0", &package).unwrap();

        let second = vec![first[0].clone(), commit(&store, &[0, 1], &identities, TX).remove(1)];
        let other_package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &second, TX).unwrap();

        let err = create_signature_share(&store, &RawTransactionCodec, "account-0-again", &other_package)
            .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
        assert!(create_signature_share(&store, &RawTransactionCodec, "account-0-again", &package).is_ok());
    }

    #[test]
    fn test_commitment_stays_consumed_after_aggregation() {
        let (store, identities) = group(3, 2);
        let first = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &first, TX).unwrap();
        let shares = shares(&store, &[0, 1], &package);
        aggregate_signature_shares(&store, &RawTransactionCodec, "coordinator", &package, &shares).unwrap();

        let second = vec![first[0].clone(), commit(&store, &[0, 1], &identities, TX).remove(1)];
        let replay =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &second, TX).unwrap();
        let err = create_signature_share(&store, &RawTransactionCodec, "account-0", &replay).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_tampered_package_rejected() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let mut package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();
        package.unsigned_transaction = b"another transaction".to_vec();

        let err = create_signature_share(&store, &RawTransactionCodec, "account-0", &package).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_aggregate_rejects_bad_share_sets() {
        let (store, identities) = group(3, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();
        let shares = shares(&store, &[0, 1], &package);

        let aggregate = |shares: &[SignatureShare]| {
            aggregate_signature_shares(&store, &RawTransactionCodec, "coordinator", &package, shares)
                .unwrap_err()
        };

        let err = aggregate(&shares[..1]);
        assert_eq!(
            err.to_string(),
            "A minimum of 2 signers is required for a valid signature. Only 1 signature shares provided"
        );

        let err = aggregate(&[shares[0].clone(), shares[0].clone()]);
        assert!(err.to_string().contains("duplicate"));

        let mut foreign = shares[1].clone();
        foreign.identity = identities[2].clone();
        let err = aggregate(&[shares[0].clone(), foreign]);
        assert!(err.to_string().contains("not part of the signing package"));

        let mut swapped = shares[1].clone();
        swapped.share = shares[0].share.clone();
        let err = aggregate(&[shares[0].clone(), swapped]);
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_verify_signature_rejects_other_transaction() {
        let (store, identities) = group(2, 2);
        let commitments = commit(&store, &[0, 1], &identities, TX);
        let package =
            create_signing_package(&store, &RawTransactionCodec, Some("coordinator"), &commitments, TX)
                .unwrap();
        let shares = shares(&store, &[0, 1], &package);
        let signed =
            aggregate_signature_shares(&store, &RawTransactionCodec, "coordinator", &package, &shares)
                .unwrap();

        let mut forged = b"other transaction".to_vec();
        forged.extend_from_slice(&signed.signature);
        let coordinator = store.get_account("coordinator").unwrap();
        let err = verify_signature(&RawTransactionCodec, &coordinator, &forged).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
