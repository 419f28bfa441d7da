//! DKG round 1: polynomial commitment and group secret key shard

use super::packages::{Round1Output, Round1PublicPackage, Round1SecretPackage, SecretState};
use crate::envelope::{Envelope, Purpose};
use crate::store::SecretStore;
use crate::types::GroupConfig;
use crate::{Error, Result};
use frost_ed25519 as frost;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

/// Run round 1 for the participant stored under `participant_name`
pub fn round1<S: SecretStore + ?Sized>(
    store: &S,
    participant_name: &str,
    config: &GroupConfig,
) -> Result<Round1Output> {
    round1_with_rng(store, participant_name, config, &mut OsRng)
}

/// [`round1`] with an explicit rng
#[instrument(skip(store, config, rng), fields(min_signers = config.min_signers(), max_signers = config.max_signers()))]
pub fn round1_with_rng<S: SecretStore + ?Sized, R: RngCore + CryptoRng>(
    store: &S,
    participant_name: &str,
    config: &GroupConfig,
    rng: &mut R,
) -> Result<Round1Output> {
    let secret = store.get_secret(participant_name)?;
    let identity = secret.to_identity();
    if !config.contains(&identity) {
        return Err(Error::Validation(format!(
            "Participant {} is not part of the given participants",
            participant_name
        )));
    }

    debug!(identity = identity.short(), "DKG round 1: commitment");
    let (frost_secret, frost_package) = frost::keys::dkg::part1(
        identity.frost_identifier()?,
        config.max_signers(),
        config.min_signers(),
        &mut *rng,
    )?;

    let mut shard = Zeroizing::new([0u8; 32]);
    rng.fill_bytes(&mut shard[..]);
    let group_secret_key_shards = config
        .participants()
        .iter()
        .map(|recipient| Envelope::seal(recipient, &shard[..], Purpose::GroupKeyShard, &mut *rng))
        .collect::<Result<Vec<_>>>()?;

    let frost_secret = Zeroizing::new(
        frost_secret
            .serialize()
            .map_err(|e| Error::Serialization(e.to_string()))?,
    );
    let state = SecretState::new(&frost_secret, config);
    let secret_package = Round1SecretPackage::seal(&state, &identity, rng)?;

    let public_package = Round1PublicPackage {
        identity: identity.clone(),
        frost_package,
        min_signers: config.min_signers(),
        group_checksum: config.checksum(),
        group_secret_key_shards,
    };

    info!(identity = identity.short(), "DKG round 1 complete");
    Ok(Round1Output {
        secret_package,
        public_package,
    })
}
