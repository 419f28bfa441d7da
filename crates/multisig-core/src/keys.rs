//! Account key derivation from a group key package

use crate::encoding::{hex_array, hex_bytes};
use crate::participant::ParticipantIdentity;
use crate::{Error, Result};
use frost_ed25519 as frost;
use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::collections::BTreeMap;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret shared by every member of a group, used only for view key material
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GroupSecretKey([u8; 32]);

impl GroupSecretKey {
    /// Fresh random key (trusted dealer)
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Combine per-participant shards (DKG)
    ///
    /// Shards are hashed in identity order so every participant gets the same key.
    pub fn from_shards(shards: &BTreeMap<ParticipantIdentity, [u8; 32]>) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("multisig 2024-01 group secret key");
        for (identity, shard) in shards {
            hasher.update(identity.as_bytes());
            hasher.update(shard);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Wallet key material of a multisig account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    /// Group verifying key
    #[serde(with = "hex_array")]
    pub authorizing_key: [u8; 32],
    #[serde(with = "hex_array")]
    pub public_address: [u8; 32],
    /// `authorizing_key || nullifier_deriving_key`
    #[serde(with = "hex_bytes")]
    pub view_key: Vec<u8>,
    #[serde(with = "hex_array")]
    pub incoming_view_key: [u8; 32],
    #[serde(with = "hex_array")]
    pub outgoing_view_key: [u8; 32],
    #[serde(with = "hex_array")]
    pub proof_authorizing_key: [u8; 32],
}

impl AccountKeys {
    /// Hex public address
    pub fn public_address_hex(&self) -> String {
        hex::encode(self.public_address)
    }
}

/// Derive account keys from a group's public key package and group secret
///
/// When a participant key package is given it must belong to the public key
/// package; the derived keys do not depend on it.
pub fn derive_account_keys(
    key_package: Option<&frost::keys::KeyPackage>,
    public_key_package: &frost::keys::PublicKeyPackage,
    group_secret_key: &GroupSecretKey,
) -> Result<AccountKeys> {
    if let Some(key_package) = key_package {
        if key_package.verifying_key() != public_key_package.verifying_key() {
            return Err(Error::Validation(
                "key package does not belong to the public key package".into(),
            ));
        }
        let expected = public_key_package
            .verifying_shares()
            .get(key_package.identifier());
        if expected != Some(key_package.verifying_share()) {
            return Err(Error::Validation(
                "key package verifying share is not part of the public key package".into(),
            ));
        }
    }

    let authorizing_key: [u8; 32] = public_key_package
        .verifying_key()
        .serialize()
        .map_err(|e| Error::Serialization(e.to_string()))?
        .try_into()
        .map_err(|_| Error::Internal("verifying key is not 32 bytes".into()))?;

    let proof_authorizing_key = expand(group_secret_key, b"proof authorizing key")?;
    let outgoing_view_key = expand(group_secret_key, b"outgoing view key")?;

    let nullifier_deriving_key =
        blake3::derive_key("multisig 2024-01 nullifier deriving key", &proof_authorizing_key);

    let mut view_key = Vec::with_capacity(64);
    view_key.extend_from_slice(&authorizing_key);
    view_key.extend_from_slice(&nullifier_deriving_key);

    let incoming_view_key = blake3::derive_key("multisig 2024-01 incoming view key", &view_key);
    let public_address = PublicKey::from(&StaticSecret::from(incoming_view_key)).to_bytes();

    Ok(AccountKeys {
        authorizing_key,
        public_address,
        view_key,
        incoming_view_key,
        outgoing_view_key,
        proof_authorizing_key,
    })
}

/// HMAC-SHA512(group secret, label), first half
fn expand(group_secret_key: &GroupSecretKey, label: &[u8]) -> Result<[u8; 32]> {
    let mut mac = Hmac::<Sha512>::new_from_slice(group_secret_key.as_bytes())
        .map_err(|e| Error::Crypto(e.to_string()))?;
    mac.update(b"multisig 2024-01 ");
    mac.update(label);
    let output = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&output[..32]);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn dealer_keys(
        seed: u64,
    ) -> (
        BTreeMap<frost::Identifier, frost::keys::KeyPackage>,
        frost::keys::PublicKeyPackage,
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (shares, public_key_package) = frost::keys::generate_with_dealer(
            3,
            2,
            frost::keys::IdentifierList::Default,
            &mut rng,
        )
        .unwrap();
        let key_packages = shares
            .into_iter()
            .map(|(id, share)| (id, frost::keys::KeyPackage::try_from(share).unwrap()))
            .collect();
        (key_packages, public_key_package)
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let (key_packages, public_key_package) = dealer_keys(1);
        let secret = GroupSecretKey::random(&mut ChaCha20Rng::seed_from_u64(2));

        let mut derived = key_packages
            .values()
            .map(|kp| derive_account_keys(Some(kp), &public_key_package, &secret).unwrap());
        let first = derived.next().unwrap();
        assert!(derived.all(|keys| keys == first));

        let coordinator = derive_account_keys(None, &public_key_package, &secret).unwrap();
        assert_eq!(coordinator, first);
        assert_eq!(first.view_key.len(), 64);
        assert_eq!(&first.view_key[..32], &first.authorizing_key);
    }

    #[test]
    fn test_group_secret_changes_view_keys() {
        let (_, public_key_package) = dealer_keys(1);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let a = derive_account_keys(None, &public_key_package, &GroupSecretKey::random(&mut rng))
            .unwrap();
        let b = derive_account_keys(None, &public_key_package, &GroupSecretKey::random(&mut rng))
            .unwrap();

        assert_eq!(a.authorizing_key, b.authorizing_key);
        assert_ne!(a.public_address, b.public_address);
        assert_ne!(a.outgoing_view_key, b.outgoing_view_key);
    }

    #[test]
    fn test_foreign_key_package_rejected() {
        let (key_packages, _) = dealer_keys(1);
        let (_, other_public_key_package) = dealer_keys(9);
        let secret = GroupSecretKey::random(&mut ChaCha20Rng::seed_from_u64(2));

        let kp = key_packages.values().next().unwrap();
        let err = derive_account_keys(Some(kp), &other_public_key_package, &secret).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_shard_combination_is_order_independent() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let ids: Vec<_> = (0..3)
            .map(|_| crate::ParticipantSecret::from_rng(&mut rng).to_identity())
            .collect();

        let forward: BTreeMap<_, _> = ids.iter().cloned().zip([[1u8; 32], [2; 32], [3; 32]]).collect();
        let backward: BTreeMap<_, _> = ids
            .iter()
            .rev()
            .cloned()
            .zip([[3u8; 32], [2; 32], [1; 32]])
            .collect();

        assert_eq!(
            GroupSecretKey::from_shards(&forward).as_bytes(),
            GroupSecretKey::from_shards(&backward).as_bytes()
        );
    }
}
