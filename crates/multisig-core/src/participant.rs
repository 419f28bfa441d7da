//! Participant secrets and their public identities
//!
//! A participant secret carries two keys: an ed25519 key that signs the
//! participant's identity and signing commitments, and an x25519 key used
//! to receive encrypted DKG material. The identity is the self-signed pair
//! of public keys; its FROST identifier is derived from the identity bytes.

use crate::encoding::hex_bytes;
use crate::{Error, Result};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use frost_ed25519 as frost;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use x25519_dalek::{PublicKey as EncryptionKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Version byte of the secret and identity encodings
pub const PARTICIPANT_VERSION: u8 = 0x72;

/// Encoded secret length
pub const SECRET_LEN: usize = 1 + 32 + 32;

/// Encoded identity length
pub const IDENTITY_LEN: usize = 1 + 32 + 32 + 64;

const IDENTITY_BODY_LEN: usize = 1 + 32 + 32;

/// Private key material of one participant. Never transmitted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ParticipantSecret {
    signing_key: [u8; 32],
    decryption_key: [u8; 32],
}

impl ParticipantSecret {
    /// Generate a fresh secret from OS entropy
    pub fn random() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// Generate a secret from the given rng
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut signing_key = [0u8; 32];
        let mut decryption_key = [0u8; 32];
        rng.fill_bytes(&mut signing_key);
        rng.fill_bytes(&mut decryption_key);
        Self {
            signing_key,
            decryption_key,
        }
    }

    /// Encode as `version || signing key || decryption key`
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(SECRET_LEN));
        bytes.push(PARTICIPANT_VERSION);
        bytes.extend_from_slice(&self.signing_key);
        bytes.extend_from_slice(&self.decryption_key);
        bytes
    }

    /// Decode from [`ParticipantSecret::to_bytes`] output
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_LEN {
            return Err(Error::Deserialization(format!(
                "participant secret must be {} bytes, got {}",
                SECRET_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != PARTICIPANT_VERSION {
            return Err(Error::Deserialization(format!(
                "unsupported participant secret version {}",
                bytes[0]
            )));
        }

        let mut secret = Self {
            signing_key: [0u8; 32],
            decryption_key: [0u8; 32],
        };
        secret.signing_key.copy_from_slice(&bytes[1..33]);
        secret.decryption_key.copy_from_slice(&bytes[33..65]);
        Ok(secret)
    }

    /// Derive the public identity
    pub fn to_identity(&self) -> ParticipantIdentity {
        let signing_key = self.signing_key();
        let encryption_key = EncryptionKey::from(&self.decryption_key());

        let mut bytes = [0u8; IDENTITY_LEN];
        bytes[0] = PARTICIPANT_VERSION;
        bytes[1..33].copy_from_slice(signing_key.verifying_key().as_bytes());
        bytes[33..65].copy_from_slice(encryption_key.as_bytes());
        let signature = signing_key.sign(&bytes[..IDENTITY_BODY_LEN]);
        bytes[IDENTITY_BODY_LEN..].copy_from_slice(&signature.to_bytes());

        ParticipantIdentity(bytes)
    }

    /// Sign `message` with the identity key
    pub(crate) fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key().sign(message).to_bytes()
    }

    pub(crate) fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.signing_key)
    }

    pub(crate) fn decryption_key(&self) -> StaticSecret {
        StaticSecret::from(self.decryption_key)
    }
}

impl fmt::Debug for ParticipantSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantSecret")
            .field("identity", &self.to_identity().short())
            .finish_non_exhaustive()
    }
}

impl Serialize for ParticipantSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        hex_bytes::serialize(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for ParticipantSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Zeroizing::new(hex_bytes::deserialize(deserializer)?);
        ParticipantSecret::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Public, self-signed identity of a participant
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantIdentity([u8; IDENTITY_LEN]);

impl ParticipantIdentity {
    /// Parse and verify an encoded identity
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; IDENTITY_LEN] = bytes.try_into().map_err(|_| {
            Error::Validation(format!(
                "identity must be {} bytes, got {}",
                IDENTITY_LEN,
                bytes.len()
            ))
        })?;
        if bytes[0] != PARTICIPANT_VERSION {
            return Err(Error::Validation(format!(
                "unsupported identity version {}",
                bytes[0]
            )));
        }

        let identity = Self(bytes);
        let signature: [u8; 64] = identity.0[IDENTITY_BODY_LEN..]
            .try_into()
            .map_err(|_| Error::Internal("identity signature length".into()))?;
        identity
            .verify(&identity.0[..IDENTITY_BODY_LEN], &signature)
            .map_err(|_| Error::Validation("identity signature is invalid".into()))?;

        Ok(identity)
    }

    /// Parse a hex-encoded identity
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| Error::Validation(format!("identity is not valid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Raw encoding
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Fixed-size digest of the identity, for map keys and file names
    pub fn fingerprint(&self) -> [u8; 32] {
        blake3::derive_key("multisig 2024-01 identity fingerprint", &self.0)
    }

    /// First bytes of the verifying key, for logs
    pub fn short(&self) -> String {
        hex::encode(&self.0[1..9])
    }

    /// Key that verifies this participant's signatures
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        let bytes: [u8; 32] = self.0[1..33]
            .try_into()
            .map_err(|_| Error::Internal("verifying key length".into()))?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::Validation(format!("invalid identity verifying key: {}", e)))
    }

    /// Key that encrypts material to this participant
    pub fn encryption_key(&self) -> EncryptionKey {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.0[33..65]);
        EncryptionKey::from(bytes)
    }

    /// FROST identifier of this participant
    pub fn frost_identifier(&self) -> Result<frost::Identifier> {
        frost::Identifier::derive(&self.0).map_err(|e| Error::Crypto(e.to_string()))
    }

    /// Verify a signature made with [`ParticipantSecret`]'s identity key
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<()> {
        let signature = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key()?
            .verify_strict(message, &signature)
            .map_err(|e| Error::Crypto(e.to_string()))
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantIdentity({})", self.short())
    }
}

impl FromStr for ParticipantIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for ParticipantIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        hex_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for ParticipantIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = hex_bytes::deserialize(deserializer)?;
        ParticipantIdentity::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}
