//! Trusted dealer group setup
//!
//! One party splits a fresh group secret into key packages for every
//! participant. The group secret only exists inside this call.

use crate::account::{AccountImport, MultisigGroup, SignerImport};
use crate::keys::{derive_account_keys, AccountKeys, GroupSecretKey};
use crate::participant::ParticipantIdentity;
use crate::types::GroupConfig;
use crate::{Error, Result};
use frost_ed25519 as frost;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use tracing::{info, instrument};

/// One participant's share of a dealer-generated group
#[derive(Debug, Clone)]
pub struct ParticipantKeyPackage {
    pub identity: ParticipantIdentity,
    pub key_package: frost::keys::KeyPackage,
}

/// Everything a trusted dealer hands out
#[derive(Debug, Clone)]
pub struct TrustedDealerKeyPackages {
    pub keys: AccountKeys,
    pub group: MultisigGroup,
    pub participants: Vec<ParticipantKeyPackage>,
}

impl TrustedDealerKeyPackages {
    /// Group verifying key
    pub fn verifying_key(&self) -> &frost::VerifyingKey {
        self.group.verifying_key()
    }

    /// Ready-to-import signer payload for every participant
    pub fn participant_imports(&self) -> Vec<(ParticipantIdentity, AccountImport)> {
        self.participants
            .iter()
            .map(|participant| {
                let import = AccountImport {
                    name: None,
                    keys: self.keys.clone(),
                    group: self.group.clone(),
                    signer: Some(SignerImport {
                        identity: participant.identity.clone(),
                        key_package: participant.key_package.clone(),
                    }),
                };
                (participant.identity.clone(), import)
            })
            .collect()
    }

    /// Payload for a coordinator (view-only) account
    pub fn coordinator_import(&self) -> AccountImport {
        AccountImport {
            name: None,
            keys: self.keys.clone(),
            group: self.group.clone(),
            signer: None,
        }
    }
}

/// Split a fresh group secret among `config`'s participants
pub fn create_trusted_dealer_key_package(config: &GroupConfig) -> Result<TrustedDealerKeyPackages> {
    create_trusted_dealer_key_package_with_rng(config, &mut OsRng)
}

/// [`create_trusted_dealer_key_package`] with an explicit rng
#[instrument(skip(config, rng), fields(min_signers = config.min_signers(), max_signers = config.max_signers()))]
pub fn create_trusted_dealer_key_package_with_rng<R: RngCore + CryptoRng>(
    config: &GroupConfig,
    rng: &mut R,
) -> Result<TrustedDealerKeyPackages> {
    let identifiers = config.identifiers()?;
    let frost_ids: Vec<frost::Identifier> = identifiers.iter().map(|(id, _)| *id).collect();

    let (shares, public_key_package) = frost::keys::generate_with_dealer(
        config.max_signers(),
        config.min_signers(),
        frost::keys::IdentifierList::Custom(&frost_ids),
        &mut *rng,
    )
    .map_err(|e| Error::Validation(format!("invalid group configuration: {}", e)))?;

    let mut participants = Vec::with_capacity(identifiers.len());
    for (identifier, identity) in identifiers {
        let share = shares
            .get(&identifier)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("dealer produced no share for {}", identity.short())))?;
        let key_package = frost::keys::KeyPackage::try_from(share)?;
        participants.push(ParticipantKeyPackage {
            identity,
            key_package,
        });
    }

    let group_secret_key = GroupSecretKey::random(rng);
    let keys = derive_account_keys(None, &public_key_package, &group_secret_key)?;

    info!(
        public_address = keys.public_address_hex(),
        participants = participants.len(),
        "Trusted dealer key packages created"
    );

    Ok(TrustedDealerKeyPackages {
        keys,
        group: MultisigGroup {
            min_signers: config.min_signers(),
            participants: config.participants().to_vec(),
            public_key_package,
        },
        participants,
    })
}
