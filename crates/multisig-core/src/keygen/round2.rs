//! DKG round 2: one encrypted share per other participant

use super::packages::{
    Round1PublicPackage, Round1SecretPackage, Round2Output, Round2PublicPackage,
    Round2SecretPackage, SecretState,
};
use crate::encoding::FrostCodec;
use crate::envelope::{Envelope, Purpose};
use crate::participant::ParticipantIdentity;
use crate::store::SecretStore;
use crate::types::GroupConfig;
use crate::{Error, Result};
use frost_ed25519 as frost;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

/// Run round 2 for the participant stored under `participant_name`
pub fn round2<S: SecretStore + ?Sized>(
    store: &S,
    participant_name: &str,
    round1_secret_package: &Round1SecretPackage,
    round1_public_packages: &[Round1PublicPackage],
) -> Result<Round2Output> {
    round2_with_rng(
        store,
        participant_name,
        round1_secret_package,
        round1_public_packages,
        &mut OsRng,
    )
}

/// [`round2`] with an explicit rng
#[instrument(skip(store, round1_secret_package, round1_public_packages, rng), fields(packages = round1_public_packages.len()))]
pub fn round2_with_rng<S: SecretStore + ?Sized, R: RngCore + CryptoRng>(
    store: &S,
    participant_name: &str,
    round1_secret_package: &Round1SecretPackage,
    round1_public_packages: &[Round1PublicPackage],
    rng: &mut R,
) -> Result<Round2Output> {
    let secret = store.get_secret(participant_name)?;
    let identity = secret.to_identity();
    let state = round1_secret_package.open(&secret)?;
    let config = state.config()?;

    let packages = collect_round1_packages(&identity, &config, round1_public_packages)?;
    let others: BTreeMap<frost::Identifier, frost::keys::dkg::round1::Package> = packages
        .iter()
        .filter(|(sender, _)| **sender != identity)
        .map(|(sender, package)| Ok((sender.frost_identifier()?, package.frost_package.clone())))
        .collect::<Result<_>>()?;

    debug!(identity = identity.short(), "DKG round 2: secret sharing");
    let frost_secret = frost::keys::dkg::round1::SecretPackage::deserialize(state.frost_secret())
        .map_err(|e| Error::Deserialization(format!("round 1 secret package: {}", e)))?;
    let (round2_secret, shares) = frost::keys::dkg::part2(frost_secret, &others)?;

    let recipients: BTreeMap<frost::Identifier, ParticipantIdentity> =
        config.identifiers()?.into_iter().collect();
    let group_checksum = config.checksum();

    let mut public_packages = Vec::with_capacity(shares.len());
    for (identifier, share) in shares {
        let recipient = recipients.get(&identifier).ok_or_else(|| {
            Error::Internal("round 2 share for an identifier outside the group".into())
        })?;
        let plaintext = Zeroizing::new(share.encode()?);
        public_packages.push(Round2PublicPackage {
            sender: identity.clone(),
            group_checksum,
            share: Envelope::seal(recipient, &plaintext, Purpose::Round2Share, &mut *rng)?,
        });
    }

    let round2_secret = Zeroizing::new(
        round2_secret
            .serialize()
            .map_err(|e| Error::Serialization(e.to_string()))?,
    );
    let secret_package =
        Round2SecretPackage::seal(&SecretState::new(&round2_secret, &config), &identity, rng)?;

    info!(
        identity = identity.short(),
        shares = public_packages.len(),
        "DKG round 2 complete"
    );
    Ok(Round2Output {
        secret_package,
        public_packages,
    })
}

/// Validate a full set of round 1 packages against the group, keyed by sender
pub(crate) fn collect_round1_packages<'a>(
    identity: &ParticipantIdentity,
    config: &GroupConfig,
    packages: &'a [Round1PublicPackage],
) -> Result<BTreeMap<ParticipantIdentity, &'a Round1PublicPackage>> {
    let expected = config.participants().len();
    if packages.len() != expected {
        return Err(Error::Validation(format!(
            "invalid input: expected {} round 1 public packages, got {}",
            expected,
            packages.len()
        )));
    }

    let checksum = config.checksum();
    let mut collected = BTreeMap::new();
    for package in packages {
        if !bool::from(package.group_checksum[..].ct_eq(&checksum[..])) {
            warn!(sender = package.identity.short(), "round 1 package for another group");
            return Err(Error::Validation(format!(
                "Round 1 public package from {} was created for a different group",
                package.identity
            )));
        }
        if !config.contains(&package.identity) {
            return Err(Error::Validation(format!(
                "Round 1 public package from {} is not from a group participant",
                package.identity
            )));
        }
        if collected.insert(package.identity.clone(), package).is_some() {
            return Err(Error::Validation(format!(
                "Duplicate round 1 public package from {}",
                package.identity
            )));
        }
    }

    if !collected.contains_key(identity) {
        return Err(Error::Validation(format!(
            "Round 1 public packages do not include {}",
            identity
        )));
    }
    Ok(collected)
}
