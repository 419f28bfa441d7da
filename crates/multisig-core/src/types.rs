//! Core types for multisig group setup

use crate::participant::ParticipantIdentity;
use crate::{Error, Result};
use frost_ed25519 as frost;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Smallest threshold a group may use
pub const MIN_SIGNERS_FLOOR: u16 = 2;

/// Group parameters: threshold plus the full participant set
///
/// `max_signers` is the size of the participant set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    min_signers: u16,
    participants: Vec<ParticipantIdentity>,
}

impl GroupConfig {
    /// Create a validated group configuration
    pub fn new(min_signers: u16, participants: Vec<ParticipantIdentity>) -> Result<Self> {
        if min_signers < MIN_SIGNERS_FLOOR {
            return Err(Error::Validation(format!(
                "minSigners must be at least {}, got {}",
                MIN_SIGNERS_FLOOR, min_signers
            )));
        }

        let max_signers = u16::try_from(participants.len()).map_err(|_| {
            Error::Validation(format!("too many participants: {}", participants.len()))
        })?;
        if min_signers > max_signers {
            return Err(Error::Validation(format!(
                "minSigners ({}) exceeds the number of participants ({})",
                min_signers, max_signers
            )));
        }

        let mut seen = BTreeSet::new();
        for identity in &participants {
            if !seen.insert(identity) {
                return Err(Error::Validation(format!(
                    "Duplicate participant identity {}",
                    identity
                )));
            }
        }

        Ok(Self {
            min_signers,
            participants,
        })
    }

    /// Threshold
    pub fn min_signers(&self) -> u16 {
        self.min_signers
    }

    /// Number of participants
    pub fn max_signers(&self) -> u16 {
        // bounded in `new`
        self.participants.len() as u16
    }

    /// Participant identities in caller order
    pub fn participants(&self) -> &[ParticipantIdentity] {
        &self.participants
    }

    /// Whether `identity` is part of the group
    pub fn contains(&self, identity: &ParticipantIdentity) -> bool {
        self.participants.contains(identity)
    }

    /// FROST identifiers paired with their identities
    pub fn identifiers(&self) -> Result<Vec<(frost::Identifier, ParticipantIdentity)>> {
        self.participants
            .iter()
            .map(|identity| Ok((identity.frost_identifier()?, identity.clone())))
            .collect()
    }

    /// Digest of the threshold and the (order-independent) participant set
    pub fn checksum(&self) -> [u8; 32] {
        group_checksum(self.min_signers, &self.participants)
    }
}

/// Digest binding a threshold to a participant set
pub fn group_checksum(min_signers: u16, participants: &[ParticipantIdentity]) -> [u8; 32] {
    let sorted: BTreeSet<&ParticipantIdentity> = participants.iter().collect();
    let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 group checksum");
    hasher.update(&min_signers.to_le_bytes());
    for identity in sorted {
        hasher.update(identity.as_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Wallet scan start point for a newly created account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHead {
    /// Block sequence
    pub sequence: u32,
    /// Block hash (hex)
    pub hash: String,
}
