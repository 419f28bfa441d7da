//! Signing commitments bound to a transaction and signer set

use crate::encoding::{hex_array, FrostCodec, Opaque};
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::store::AccountStore;
use crate::transaction::TransactionCodec;
use crate::{Error, Result};
use frost_ed25519 as frost;
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

const COMMITMENT_DOMAIN: &[u8] = b"multisig 2024-01 signing commitment";

/// Nonce commitments of one signer for one `(transaction, signer set)` pair
///
/// The identity signature covers the checksum, so a commitment cannot be
/// replayed for another transaction or signer set without detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningCommitment {
    pub identity: ParticipantIdentity,
    #[serde(with = "hex_array")]
    pub hiding: [u8; 32],
    #[serde(with = "hex_array")]
    pub binding: [u8; 32],
    #[serde(with = "hex_array")]
    pub checksum: [u8; 32],
    pub seed: u64,
    #[serde(with = "hex_array")]
    pub signature: [u8; 64],
}

impl Opaque for SigningCommitment {}

impl SigningCommitment {
    /// FROST view of the nonce commitments
    pub fn frost_commitments(&self) -> Result<frost::round1::SigningCommitments> {
        let hiding = frost::round1::NonceCommitment::deserialize(&self.hiding)
            .map_err(|e| Error::Deserialization(format!("hiding commitment: {}", e)))?;
        let binding = frost::round1::NonceCommitment::deserialize(&self.binding)
            .map_err(|e| Error::Deserialization(format!("binding commitment: {}", e)))?;
        Ok(frost::round1::SigningCommitments::new(hiding, binding))
    }

    /// Whether this commitment was generated for `transaction_hash` and exactly `signers`
    pub fn is_bound_to(&self, transaction_hash: &[u8; 32], signers: &[ParticipantIdentity]) -> bool {
        let expected = signers_checksum(transaction_hash, signers);
        if !bool::from(self.checksum[..].ct_eq(&expected[..])) {
            return false;
        }
        self.identity
            .verify(&self.signed_message(), &self.signature)
            .is_ok()
    }

    /// Ledger key of this commitment
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 signing commitment digest");
        hasher.update(&self.signed_message());
        hasher.update(self.identity.as_bytes());
        *hasher.finalize().as_bytes()
    }

    fn signed_message(&self) -> Vec<u8> {
        signed_message(&self.hiding, &self.binding, &self.checksum, self.seed)
    }
}

fn signed_message(hiding: &[u8; 32], binding: &[u8; 32], checksum: &[u8; 32], seed: u64) -> Vec<u8> {
    let mut message = Vec::with_capacity(COMMITMENT_DOMAIN.len() + 104);
    message.extend_from_slice(COMMITMENT_DOMAIN);
    message.extend_from_slice(hiding);
    message.extend_from_slice(binding);
    message.extend_from_slice(checksum);
    message.extend_from_slice(&seed.to_le_bytes());
    message
}

/// Digest of a transaction hash and an (order-independent) signer set
pub fn signers_checksum(transaction_hash: &[u8; 32], signers: &[ParticipantIdentity]) -> [u8; 32] {
    let sorted: BTreeSet<&ParticipantIdentity> = signers.iter().collect();
    let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 signing commitment checksum");
    hasher.update(transaction_hash);
    for identity in sorted {
        hasher.update(identity.as_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Nonces for a commitment, recomputable by the signer from public inputs and its own secrets
pub(crate) fn derive_nonces(
    secret: &ParticipantSecret,
    key_package: &frost::keys::KeyPackage,
    checksum: &[u8; 32],
    seed: u64,
) -> Result<(frost::round1::SigningNonces, frost::round1::SigningCommitments)> {
    let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 signing nonces");
    hasher.update(&secret.to_bytes());
    hasher.update(&Zeroizing::new(key_package.encode()?));
    hasher.update(checksum);
    hasher.update(&seed.to_le_bytes());
    let mut rng = ChaCha20Rng::from_seed(*hasher.finalize().as_bytes());

    Ok(frost::round1::commit(key_package.signing_share(), &mut rng))
}

fn nonce_commitment_bytes(commitment: &frost::round1::NonceCommitment) -> Result<[u8; 32]> {
    commitment
        .serialize()
        .map_err(|e| Error::Serialization(e.to_string()))?
        .try_into()
        .map_err(|_| Error::Internal("nonce commitment is not 32 bytes".into()))
}

/// Create this account's commitment for `unsigned_transaction` signed by `signers`
///
/// Without a `seed` the commitment uses fresh entropy.
#[instrument(skip(store, codec, unsigned_transaction, signers), fields(signers = signers.len()))]
pub fn create_signing_commitment<S, C>(
    store: &S,
    codec: &C,
    account: &str,
    unsigned_transaction: &[u8],
    signers: &[ParticipantIdentity],
    seed: Option<u64>,
) -> Result<SigningCommitment>
where
    S: AccountStore + ?Sized,
    C: TransactionCodec + ?Sized,
{
    let account = store.get_account(account)?;
    let (secret, key_package) = account.signer()?;
    let identity = secret.to_identity();

    if !signers.contains(&identity) {
        return Err(Error::Validation(format!(
            "Account {} is not a multisig signer account for the given signers: {} is not one of them",
            account.name, identity
        )));
    }
    let mut seen = BTreeSet::new();
    for (i, signer) in signers.iter().enumerate() {
        if !account.group.contains(signer) {
            return Err(Error::Validation(format!(
                "Signer {} is identity {}, which is not part of the multisig group for account {}",
                i + 1,
                signer,
                account.name
            )));
        }
        if !seen.insert(signer) {
            return Err(Error::Validation(format!(
                "Signer {} is a duplicate of identity {}",
                i + 1,
                signer
            )));
        }
    }

    let transaction_hash = codec.transaction_hash(unsigned_transaction)?;
    let checksum = signers_checksum(&transaction_hash, signers);
    let seed = seed.unwrap_or_else(|| OsRng.next_u64());

    debug!(identity = identity.short(), seed, "deriving signing nonces");
    let (_, commitments) = derive_nonces(secret, key_package, &checksum, seed)?;
    let hiding = nonce_commitment_bytes(commitments.hiding())?;
    let binding = nonce_commitment_bytes(commitments.binding())?;
    let signature = secret.sign(&signed_message(&hiding, &binding, &checksum, seed));

    info!(
        account = %account.name,
        identity = identity.short(),
        transaction_hash = hex::encode(transaction_hash),
        "Signing commitment created"
    );
    Ok(SigningCommitment {
        identity,
        hiding,
        binding,
        checksum,
        seed,
        signature,
    })
}
