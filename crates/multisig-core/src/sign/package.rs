//! Signing package construction and validation

use super::commitment::SigningCommitment;
use crate::account::MultisigAccount;
use crate::encoding::{frost_serde, hex_array, hex_bytes, Opaque};
use crate::participant::ParticipantIdentity;
use crate::store::{resolve_account, AccountStore};
use crate::transaction::TransactionCodec;
use crate::{Error, Result};
use frost_ed25519 as frost;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

/// Validated commitments plus the transaction they sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningPackage {
    #[serde(with = "hex_bytes")]
    pub unsigned_transaction: Vec<u8>,
    #[serde(with = "hex_array")]
    pub transaction_hash: [u8; 32],
    pub commitments: Vec<SigningCommitment>,
    #[serde(with = "frost_serde")]
    pub frost_package: frost::SigningPackage,
}

impl Opaque for SigningPackage {}

impl SigningPackage {
    /// Identities of the signer set
    pub fn signers(&self) -> Vec<ParticipantIdentity> {
        self.commitments.iter().map(|c| c.identity.clone()).collect()
    }

    pub fn commitment_for(&self, identity: &ParticipantIdentity) -> Option<&SigningCommitment> {
        self.commitments.iter().find(|c| &c.identity == identity)
    }

    /// Ledger key of this package
    pub fn digest(&self) -> Result<[u8; 32]> {
        let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 signing package digest");
        hasher.update(&self.to_bytes()?);
        Ok(*hasher.finalize().as_bytes())
    }

    /// Check that the package is internally consistent and belongs to `account`
    ///
    /// Packages arrive from the coordinator, so signers and aggregators
    /// re-check what [`create_signing_package`] checked.
    pub fn validate<C: TransactionCodec + ?Sized>(&self, codec: &C, account: &MultisigAccount) -> Result<()> {
        let transaction_hash = codec.transaction_hash(&self.unsigned_transaction)?;
        if !bool::from(transaction_hash[..].ct_eq(&self.transaction_hash[..]))
            || self.frost_package.message()[..] != transaction_hash[..]
        {
            return Err(Error::Consistency(
                "Signing package does not match its unsigned transaction".into(),
            ));
        }

        let signers = self.signers();
        for (i, commitment) in self.commitments.iter().enumerate() {
            check_member(account, i, commitment)?;
            if !commitment.is_bound_to(&transaction_hash, &signers) {
                return Err(not_bound(i));
            }
            let identifier = commitment.identity.frost_identifier()?;
            let expected = commitment.frost_commitments()?;
            if self.frost_package.signing_commitments().get(&identifier) != Some(&expected) {
                return Err(Error::Consistency(format!(
                    "Commitment {} does not match the signing package",
                    i + 1
                )));
            }
        }
        if self.frost_package.signing_commitments().len() != self.commitments.len() {
            return Err(Error::Consistency(
                "Signing package carries commitments without a signer".into(),
            ));
        }
        Ok(())
    }
}

fn check_member(account: &MultisigAccount, i: usize, commitment: &SigningCommitment) -> Result<()> {
    if account.group.contains(&commitment.identity) {
        return Ok(());
    }
    warn!(index = i + 1, identity = commitment.identity.short(), "commitment from outside the group");
    Err(Error::Consistency(format!(
        "Commitment {} is from identity {}, which is not part of the multisig group for account {}",
        i + 1,
        commitment.identity,
        account.name
    )))
}

fn not_bound(i: usize) -> Error {
    Error::Consistency(format!(
        "Commitment {} was not generated for the given unsigned transaction and signer set",
        i + 1
    ))
}

/// Assemble the signing package for `unsigned_transaction`
///
/// Uses the default account when `account` is `None`.
#[instrument(skip(store, codec, commitments, unsigned_transaction), fields(commitments = commitments.len()))]
pub fn create_signing_package<S, C>(
    store: &S,
    codec: &C,
    account: Option<&str>,
    commitments: &[SigningCommitment],
    unsigned_transaction: &[u8],
) -> Result<SigningPackage>
where
    S: AccountStore + ?Sized,
    C: TransactionCodec + ?Sized,
{
    let account = resolve_account(store, account)?;
    let transaction_hash = codec.transaction_hash(unsigned_transaction)?;

    let min_signers = usize::from(account.group.min_signers);
    if commitments.len() < min_signers {
        return Err(Error::Validation(format!(
            "A minimum of {} signers is required for a valid signature. Only {} commitments provided",
            min_signers,
            commitments.len()
        )));
    }

    for (i, commitment) in commitments.iter().enumerate() {
        check_member(&account, i, commitment)?;
    }

    let mut seen = BTreeSet::new();
    for (i, commitment) in commitments.iter().enumerate() {
        if !seen.insert(&commitment.identity) {
            return Err(Error::Validation(format!(
                "Commitment {} is a duplicate of identity {}",
                i + 1,
                commitment.identity
            )));
        }
    }

    let signers: Vec<ParticipantIdentity> = commitments.iter().map(|c| c.identity.clone()).collect();
    let mut frost_commitments = BTreeMap::new();
    for (i, commitment) in commitments.iter().enumerate() {
        if !commitment.is_bound_to(&transaction_hash, &signers) {
            warn!(index = i + 1, identity = commitment.identity.short(), "unbound commitment");
            return Err(not_bound(i));
        }
        frost_commitments.insert(
            commitment.identity.frost_identifier()?,
            commitment.frost_commitments()?,
        );
    }

    let frost_package = frost::SigningPackage::new(frost_commitments, &transaction_hash);

    info!(
        account = %account.name,
        signers = signers.len(),
        transaction_hash = hex::encode(transaction_hash),
        "Signing package created"
    );
    Ok(SigningPackage {
        unsigned_transaction: unsigned_transaction.to_vec(),
        transaction_hash,
        commitments: commitments.to_vec(),
        frost_package,
    })
}
