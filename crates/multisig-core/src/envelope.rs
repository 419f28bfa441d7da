//! Encryption of payloads to a single participant identity
//!
//! Ephemeral x25519 agreement with the recipient's encryption key, a
//! blake3-derived key, and ChaCha20-Poly1305 with the recipient identity as
//! associated data.

use crate::encoding::{hex_array, hex_bytes};
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::{Error, Result};
use aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as EncryptionKey, StaticSecret};
use zeroize::Zeroizing;

/// Domain separation for each kind of encrypted payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Round1Secret,
    Round2Secret,
    Round2Share,
    GroupKeyShard,
}

impl Purpose {
    fn context(self) -> &'static str {
        match self {
            Purpose::Round1Secret => "multisig 2024-01 dkg round1 secret package",
            Purpose::Round2Secret => "multisig 2024-01 dkg round2 secret package",
            Purpose::Round2Share => "multisig 2024-01 dkg round2 public package",
            Purpose::GroupKeyShard => "multisig 2024-01 dkg group secret key shard",
        }
    }
}

/// A payload readable only by `recipient`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    recipient: ParticipantIdentity,
    #[serde(with = "hex_array")]
    ephemeral_public: [u8; 32],
    #[serde(with = "hex_array")]
    nonce: [u8; 12],
    #[serde(with = "hex_bytes")]
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt `plaintext` to `recipient`
    pub fn seal<R: RngCore + CryptoRng>(
        recipient: &ParticipantIdentity,
        plaintext: &[u8],
        purpose: Purpose,
        rng: &mut R,
    ) -> Result<Self> {
        let mut ephemeral_bytes = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut ephemeral_bytes[..]);
        let ephemeral = StaticSecret::from(*ephemeral_bytes);
        let ephemeral_public = EncryptionKey::from(&ephemeral).to_bytes();

        let recipient_key = recipient.encryption_key();
        let shared = ephemeral.diffie_hellman(&recipient_key);
        if !shared.was_contributory() {
            return Err(Error::Crypto("recipient encryption key is low order".into()));
        }
        let key = derive_key(
            purpose,
            shared.as_bytes(),
            &ephemeral_public,
            recipient_key.as_bytes(),
        );

        let mut nonce = [0u8; 12];
        rng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: recipient.as_bytes(),
                },
            )
            .map_err(|_| Error::Crypto("encryption failed".into()))?;

        Ok(Self {
            recipient: recipient.clone(),
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with the recipient's secret
    pub fn open(&self, secret: &ParticipantSecret, purpose: Purpose) -> Result<Zeroizing<Vec<u8>>> {
        let identity = secret.to_identity();
        if identity != self.recipient {
            return Err(Error::Decryption(format!(
                "ciphertext is addressed to {} and cannot be decrypted by {}",
                self.recipient.short(),
                identity.short()
            )));
        }

        let decryption_key = secret.decryption_key();
        let shared = decryption_key.diffie_hellman(&EncryptionKey::from(self.ephemeral_public));
        let key = derive_key(
            purpose,
            shared.as_bytes(),
            &self.ephemeral_public,
            identity.encryption_key().as_bytes(),
        );

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        cipher
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: self.recipient.as_bytes(),
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| Error::Decryption("ciphertext could not be decrypted".into()))
    }

    /// Identity able to open this envelope
    pub fn recipient(&self) -> &ParticipantIdentity {
        &self.recipient
    }
}

fn derive_key(
    purpose: Purpose,
    shared: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut hasher = blake3::Hasher::new_derive_key(purpose.context());
    hasher.update(shared);
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    Zeroizing::new(*hasher.finalize().as_bytes())
}
