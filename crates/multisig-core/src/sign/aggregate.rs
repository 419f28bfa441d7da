//! Aggregation of signature shares into a signed transaction

use super::package::SigningPackage;
use super::share::SignatureShare;
use crate::account::MultisigAccount;
use crate::encoding::{hex_array, hex_bytes, FrostCodec};
use crate::store::AccountStore;
use crate::transaction::{TransactionCodec, SIGNATURE_LEN};
use crate::{Error, Result};
use frost_ed25519 as frost;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

/// Postable transaction plus the group signature it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(with = "hex_bytes")]
    pub transaction: Vec<u8>,
    #[serde(with = "hex_array")]
    pub signature: [u8; SIGNATURE_LEN],
}

/// Combine `shares` into the group signature and attach it to the transaction
#[instrument(skip(store, codec, signing_package, shares), fields(shares = shares.len()))]
pub fn aggregate_signature_shares<S, C>(
    store: &S,
    codec: &C,
    account: &str,
    signing_package: &SigningPackage,
    shares: &[SignatureShare],
) -> Result<SignedTransaction>
where
    S: AccountStore + ?Sized,
    C: TransactionCodec + ?Sized,
{
    let account = store.get_account(account)?;
    signing_package.validate(codec, &account)?;

    let min_signers = usize::from(account.group.min_signers);
    if shares.len() < min_signers {
        return Err(Error::Validation(format!(
            "A minimum of {} signers is required for a valid signature. Only {} signature shares provided",
            min_signers,
            shares.len()
        )));
    }

    let mut frost_shares = BTreeMap::new();
    for (i, share) in shares.iter().enumerate() {
        if signing_package.commitment_for(&share.identity).is_none() {
            warn!(index = i + 1, identity = share.identity.short(), "share from outside the signer set");
            return Err(Error::Validation(format!(
                "Signature share {} is from identity {}, which is not part of the signing package",
                i + 1,
                share.identity
            )));
        }
        if frost_shares
            .insert(share.identity.frost_identifier()?, share.share.clone())
            .is_some()
        {
            return Err(Error::Validation(format!(
                "Signature share {} is a duplicate of identity {}",
                i + 1,
                share.identity
            )));
        }
    }
    if frost_shares.len() != signing_package.commitments.len() {
        return Err(Error::Validation(format!(
            "Expected {} signature shares for the signing package, got {}",
            signing_package.commitments.len(),
            frost_shares.len()
        )));
    }

    let signature = frost::aggregate(
        &signing_package.frost_package,
        &frost_shares,
        &account.group.public_key_package,
    )
    .map_err(|e| {
        warn!(error = %e, "signature shares rejected");
        Error::Validation(format!("Signature shares do not match the signing package: {}", e))
    })?;

    if let Err(e) = account
        .group
        .verifying_key()
        .verify(&signing_package.transaction_hash, &signature)
    {
        error!(
            account = %account.name,
            error = %e,
            "aggregated signature does not verify against the group key"
        );
        return Err(Error::Internal(format!(
            "aggregated signature does not verify for account {}",
            account.name
        )));
    }

    let signature: [u8; SIGNATURE_LEN] = signature
        .encode()?
        .try_into()
        .map_err(|_| Error::Internal("signature is not 64 bytes".into()))?;
    let transaction = codec.attach_signature(&signing_package.unsigned_transaction, &signature)?;

    info!(
        account = %account.name,
        transaction_hash = hex::encode(signing_package.transaction_hash),
        "Signature shares aggregated"
    );
    Ok(SignedTransaction {
        transaction,
        signature,
    })
}

/// Check a signed transaction against `account`'s group key
pub fn verify_signature<C: TransactionCodec + ?Sized>(
    codec: &C,
    account: &MultisigAccount,
    signed_transaction: &[u8],
) -> Result<()> {
    let (unsigned, signature) = codec.split_signed(signed_transaction)?;
    let transaction_hash = codec.transaction_hash(&unsigned)?;
    let signature = frost::Signature::decode(&signature)?;

    account
        .group
        .verifying_key()
        .verify(&transaction_hash, &signature)
        .map_err(|_| {
            Error::Validation(format!(
                "Transaction signature does not verify against the group key of account {}",
                account.name
            ))
        })
}
