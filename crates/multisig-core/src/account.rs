//! Multisig wallet accounts
//!
//! An account is either a signer (one participant's key package plus that
//! participant's secret) or a coordinator (public key package and view keys
//! only). The role is an enum so that signing with a coordinator is an
//! explicit error path.

use crate::encoding::{frost_serde, Opaque};
use crate::keys::AccountKeys;
use crate::participant::{ParticipantIdentity, ParticipantSecret};
use crate::types::{AccountHead, GroupConfig};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use frost_ed25519 as frost;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public description of the group behind an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultisigGroup {
    pub min_signers: u16,
    pub participants: Vec<ParticipantIdentity>,
    #[serde(with = "frost_serde")]
    pub public_key_package: frost::keys::PublicKeyPackage,
}

impl MultisigGroup {
    pub fn max_signers(&self) -> usize {
        self.participants.len()
    }

    /// Whether `identity` is a co-signer of this group
    pub fn contains(&self, identity: &ParticipantIdentity) -> bool {
        self.participants.contains(identity)
    }

    pub fn verifying_key(&self) -> &frost::VerifyingKey {
        self.public_key_package.verifying_key()
    }

    /// Re-check a group received from outside: threshold bounds, distinct
    /// participants, and one verifying share per participant
    pub fn validate(&self) -> Result<GroupConfig> {
        let config = GroupConfig::new(self.min_signers, self.participants.clone())?;

        let shares = self.public_key_package.verifying_shares();
        if shares.len() != self.participants.len() {
            return Err(Error::Validation(format!(
                "public key package has {} verifying shares for {} participants",
                shares.len(),
                self.participants.len()
            )));
        }
        for (identifier, identity) in config.identifiers()? {
            if !shares.contains_key(&identifier) {
                return Err(Error::Validation(format!(
                    "identity {} has no verifying share in the public key package",
                    identity
                )));
            }
        }
        Ok(config)
    }
}

/// Spending authority held by an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AccountRole {
    /// Can produce signature shares
    Signer {
        secret: ParticipantSecret,
        #[serde(with = "frost_serde")]
        key_package: frost::keys::KeyPackage,
    },
    /// Can build signing packages and aggregate, never sign
    Coordinator,
}

/// A wallet account controlled by a multisig group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigAccount {
    pub id: Uuid,
    pub name: String,
    pub keys: AccountKeys,
    pub group: MultisigGroup,
    pub role: AccountRole,
    pub created_at: Option<AccountHead>,
    pub imported_at: DateTime<Utc>,
}

impl MultisigAccount {
    /// Create a new account record
    pub fn new(
        name: &str,
        keys: AccountKeys,
        group: MultisigGroup,
        role: AccountRole,
        created_at: Option<AccountHead>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::Validation("account name must not be empty".into()));
        }
        if let AccountRole::Signer { secret, .. } = &role {
            let identity = secret.to_identity();
            if !group.contains(&identity) {
                return Err(Error::Validation(format!(
                    "identity {} is not part of the multisig group",
                    identity
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            keys,
            group,
            role,
            created_at,
            imported_at: Utc::now(),
        })
    }

    pub fn is_signer(&self) -> bool {
        matches!(self.role, AccountRole::Signer { .. })
    }

    /// Secret and key package of a signer account
    pub fn signer(&self) -> Result<(&ParticipantSecret, &frost::keys::KeyPackage)> {
        match &self.role {
            AccountRole::Signer {
                secret,
                key_package,
            } => Ok((secret, key_package)),
            AccountRole::Coordinator => Err(Error::Validation(format!(
                "Account {} is not a multisig signer account",
                self.name
            ))),
        }
    }

    /// This account's own identity, if it is a signer
    pub fn identity(&self) -> Option<ParticipantIdentity> {
        match &self.role {
            AccountRole::Signer { secret, .. } => Some(secret.to_identity()),
            AccountRole::Coordinator => None,
        }
    }

    /// Whether both accounts sign with the same participant in the same group
    pub fn shares_key_package_with(&self, other: &MultisigAccount) -> bool {
        match (self.identity(), other.identity()) {
            (Some(mine), Some(theirs)) => {
                mine == theirs && self.group.verifying_key() == other.group.verifying_key()
            }
            _ => false,
        }
    }

    /// Export payload; never contains the participant secret
    pub fn to_import(&self) -> AccountImport {
        let signer = match &self.role {
            AccountRole::Signer {
                secret,
                key_package,
            } => Some(SignerImport {
                identity: secret.to_identity(),
                key_package: key_package.clone(),
            }),
            AccountRole::Coordinator => None,
        };

        AccountImport {
            name: Some(self.name.clone()),
            keys: self.keys.clone(),
            group: self.group.clone(),
            signer,
        }
    }
}

/// A signer's part of an import payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerImport {
    pub identity: ParticipantIdentity,
    #[serde(with = "frost_serde")]
    pub key_package: frost::keys::KeyPackage,
}

/// Serialized, ready-to-import account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountImport {
    pub name: Option<String>,
    pub keys: AccountKeys,
    pub group: MultisigGroup,
    pub signer: Option<SignerImport>,
}

impl Opaque for AccountImport {}

impl AccountImport {
    /// Turn the payload into an account
    ///
    /// A signer payload needs the secret matching its identity.
    pub fn into_account(
        self,
        name: Option<&str>,
        secret: Option<ParticipantSecret>,
        created_at: Option<AccountHead>,
    ) -> Result<MultisigAccount> {
        let name = name
            .map(str::to_string)
            .or(self.name)
            .ok_or_else(|| Error::Validation("account name is required".into()))?;

        self.group.validate()?;

        let role = match (self.signer, secret) {
            (None, _) => AccountRole::Coordinator,
            (Some(signer), Some(secret)) => {
                if secret.to_identity() != signer.identity {
                    return Err(Error::Validation(format!(
                        "participant secret does not match identity {}",
                        signer.identity
                    )));
                }
                check_key_package(&self.group, &signer)?;
                AccountRole::Signer {
                    secret,
                    key_package: signer.key_package,
                }
            }
            (Some(signer), None) => {
                return Err(Error::NotFound(format!(
                    "No participant secret found for identity {}",
                    signer.identity
                )))
            }
        };

        MultisigAccount::new(&name, self.keys, self.group, role, created_at)
    }
}

/// A signer's key package must be the group's share for that signer
fn check_key_package(group: &MultisigGroup, signer: &SignerImport) -> Result<()> {
    let key_package = &signer.key_package;
    if key_package.verifying_key() != group.verifying_key() {
        return Err(Error::Validation(
            "key package does not belong to the account's group".into(),
        ));
    }
    if *key_package.min_signers() != group.min_signers {
        return Err(Error::Validation(format!(
            "key package threshold {} does not match the group threshold {}",
            key_package.min_signers(),
            group.min_signers
        )));
    }
    if *key_package.identifier() != signer.identity.frost_identifier()? {
        return Err(Error::Validation(format!(
            "key package was not issued to identity {}",
            signer.identity
        )));
    }
    if group
        .public_key_package
        .verifying_shares()
        .get(key_package.identifier())
        != Some(key_package.verifying_share())
    {
        return Err(Error::Validation(
            "key package verifying share is not part of the public key package".into(),
        ));
    }
    Ok(())
}
