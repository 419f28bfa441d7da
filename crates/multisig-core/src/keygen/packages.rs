//! DKG round packages
//!
//! Public packages are broadcast by the coordinator. Secret packages are
//! sealed to their owner's identity, so handing round 3 somebody else's
//! secret package fails to decrypt instead of producing a wrong key.

use crate::encoding::{frost_serde, hex_array, hex_bytes, Opaque};
use crate::envelope::{Envelope, Purpose};
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::types::GroupConfig;
use crate::Result;
use frost_ed25519 as frost;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Round 1 broadcast: polynomial commitment plus one group secret key shard per participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round1PublicPackage {
    pub identity: ParticipantIdentity,
    #[serde(with = "frost_serde")]
    pub frost_package: frost::keys::dkg::round1::Package,
    pub min_signers: u16,
    #[serde(with = "hex_array")]
    pub group_checksum: [u8; 32],
    pub group_secret_key_shards: Vec<Envelope>,
}

impl Opaque for Round1PublicPackage {}

impl Round1PublicPackage {
    /// The shard this package carries for `recipient`
    pub fn shard_for(&self, recipient: &ParticipantIdentity) -> Option<&Envelope> {
        self.group_secret_key_shards
            .iter()
            .find(|shard| shard.recipient() == recipient)
    }
}

/// Round 1 secret state, readable only by its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round1SecretPackage(Envelope);

impl Opaque for Round1SecretPackage {}

/// Round 2 share addressed to exactly one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round2PublicPackage {
    pub sender: ParticipantIdentity,
    #[serde(with = "hex_array")]
    pub group_checksum: [u8; 32],
    pub share: Envelope,
}

impl Opaque for Round2PublicPackage {}

impl Round2PublicPackage {
    pub fn recipient(&self) -> &ParticipantIdentity {
        self.share.recipient()
    }
}

/// Round 2 secret state, readable only by its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round2SecretPackage(Envelope);

impl Opaque for Round2SecretPackage {}

/// Output of DKG round 1
#[derive(Debug, Clone)]
pub struct Round1Output {
    pub secret_package: Round1SecretPackage,
    pub public_package: Round1PublicPackage,
}

/// Output of DKG round 2
#[derive(Debug, Clone)]
pub struct Round2Output {
    pub secret_package: Round2SecretPackage,
    pub public_packages: Vec<Round2PublicPackage>,
}

/// Plaintext behind both secret packages
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct SecretState {
    #[serde(with = "hex_bytes")]
    frost_secret: Vec<u8>,
    #[zeroize(skip)]
    min_signers: u16,
    #[zeroize(skip)]
    participants: Vec<ParticipantIdentity>,
}

impl Opaque for SecretState {}

impl SecretState {
    pub(crate) fn new(frost_secret: &[u8], config: &GroupConfig) -> Self {
        Self {
            frost_secret: frost_secret.to_vec(),
            min_signers: config.min_signers(),
            participants: config.participants().to_vec(),
        }
    }

    pub(crate) fn frost_secret(&self) -> &[u8] {
        &self.frost_secret
    }

    /// Group the state was created for
    pub(crate) fn config(&self) -> Result<GroupConfig> {
        GroupConfig::new(self.min_signers, self.participants.clone())
    }

    fn seal<R: RngCore + CryptoRng>(
        &self,
        owner: &ParticipantIdentity,
        purpose: Purpose,
        rng: &mut R,
    ) -> Result<Envelope> {
        let plaintext = Zeroizing::new(self.to_bytes()?);
        Envelope::seal(owner, &plaintext, purpose, rng)
    }

    fn open(envelope: &Envelope, secret: &ParticipantSecret, purpose: Purpose) -> Result<Self> {
        let plaintext = envelope.open(secret, purpose)?;
        Self::from_bytes(&plaintext)
    }
}

impl Round1SecretPackage {
    pub(crate) fn seal<R: RngCore + CryptoRng>(
        state: &SecretState,
        owner: &ParticipantIdentity,
        rng: &mut R,
    ) -> Result<Self> {
        state.seal(owner, Purpose::Round1Secret, rng).map(Self)
    }

    pub(crate) fn open(&self, secret: &ParticipantSecret) -> Result<SecretState> {
        SecretState::open(&self.0, secret, Purpose::Round1Secret)
    }
}

impl Round2SecretPackage {
    pub(crate) fn seal<R: RngCore + CryptoRng>(
        state: &SecretState,
        owner: &ParticipantIdentity,
        rng: &mut R,
    ) -> Result<Self> {
        state.seal(owner, Purpose::Round2Secret, rng).map(Self)
    }

    pub(crate) fn open(&self, secret: &ParticipantSecret) -> Result<SecretState> {
        SecretState::open(&self.0, secret, Purpose::Round2Secret)
    }
}
