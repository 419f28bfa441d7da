//! Signature share generation

use super::commitment::derive_nonces;
use super::package::SigningPackage;
use crate::encoding::{frost_serde, FrostCodec, Opaque};
use crate::participant::ParticipantIdentity;
use crate::store::AccountStore;
use crate::transaction::TransactionCodec;
use crate::{Error, Result};
use frost_ed25519 as frost;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// One signer's partial signature over a signing package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureShare {
    pub identity: ParticipantIdentity,
    #[serde(with = "frost_serde")]
    pub share: frost::round2::SignatureShare,
}

impl Opaque for SignatureShare {}

/// Sign `signing_package` with `account`'s key package
///
/// The account's commitment in the package is consumed: using it again for a
/// different signing package fails.
#[instrument(skip(store, codec, signing_package), fields(signers = signing_package.commitments.len()))]
pub fn create_signature_share<S, C>(
    store: &S,
    codec: &C,
    account: &str,
    signing_package: &SigningPackage,
) -> Result<SignatureShare>
where
    S: AccountStore + ?Sized,
    C: TransactionCodec + ?Sized,
{
    let account = store.get_account(account)?;
    let (secret, key_package) = account.signer()?;
    let identity = secret.to_identity();

    signing_package.validate(codec, &account)?;

    let commitment = signing_package.commitment_for(&identity).ok_or_else(|| {
        Error::Validation(format!(
            "Identity {} of account {} is not part of the signing package signer set",
            identity, account.name
        ))
    })?;

    debug!(identity = identity.short(), seed = commitment.seed, "recomputing signing nonces");
    let (nonces, commitments) = derive_nonces(secret, key_package, &commitment.checksum, commitment.seed)?;
    if commitments != commitment.frost_commitments()? {
        return Err(Error::Consistency(format!(
            "Commitment from identity {} was not generated by account {}",
            identity, account.name
        )));
    }

    store.record_commitment_use(&identity, commitment.digest(), signing_package.digest()?)?;

    let share = frost::round2::sign(&signing_package.frost_package, &nonces, key_package)?;

    info!(
        account = %account.name,
        identity = identity.short(),
        share = hex::encode(share.encode()?),
        "Signature share created"
    );
    Ok(SignatureShare { identity, share })
}
