//! Distributed Key Generation (DKG) module
//!
//! Three rounds over FROST's DKG parts. Each round is a plain function of its
//! inputs plus a secret store lookup; the caller carries packages between
//! rounds and delivers every participant's output to every other participant.

mod packages;
mod round1;
mod round2;
mod round3;

pub use packages::*;
pub use round1::{round1, round1_with_rng};
pub use round2::{round2, round2_with_rng};
pub use round3::round3;

use crate::account::MultisigAccount;
use crate::store::{AccountStore, SecretStore};
use crate::types::{AccountHead, GroupConfig};
use crate::Result;

/// Session before round 1
#[derive(Debug)]
pub struct Idle;

/// Session holding the round 1 secret package
#[derive(Debug)]
pub struct Round1Done {
    secret_package: Round1SecretPackage,
}

/// Session holding the round 2 secret package
#[derive(Debug)]
pub struct Round2Done {
    secret_package: Round2SecretPackage,
}

/// DKG state machine for one participant
///
/// Each round consumes the session, so rounds cannot run out of order and a
/// failed round leaves nothing behind.
#[derive(Debug)]
pub struct DkgSession<State> {
    participant_name: String,
    state: State,
}

impl<State> DkgSession<State> {
    /// Name of the participant secret driving this session
    pub fn participant_name(&self) -> &str {
        &self.participant_name
    }
}

impl DkgSession<Idle> {
    /// Create a new DKG session
    pub fn new(participant_name: &str) -> Self {
        Self {
            participant_name: participant_name.to_string(),
            state: Idle,
        }
    }

    /// Run round 1, returning the package to broadcast
    pub fn round1<S: SecretStore + ?Sized>(
        self,
        store: &S,
        config: &GroupConfig,
    ) -> Result<(DkgSession<Round1Done>, Round1PublicPackage)> {
        let output = round1(store, &self.participant_name, config)?;
        Ok((
            DkgSession {
                participant_name: self.participant_name,
                state: Round1Done {
                    secret_package: output.secret_package,
                },
            },
            output.public_package,
        ))
    }
}

impl DkgSession<Round1Done> {
    pub fn secret_package(&self) -> &Round1SecretPackage {
        &self.state.secret_package
    }

    /// Run round 2, returning the packages to deliver to the other participants
    pub fn round2<S: SecretStore + ?Sized>(
        self,
        store: &S,
        round1_public_packages: &[Round1PublicPackage],
    ) -> Result<(DkgSession<Round2Done>, Vec<Round2PublicPackage>)> {
        let output = round2(
            store,
            &self.participant_name,
            &self.state.secret_package,
            round1_public_packages,
        )?;
        Ok((
            DkgSession {
                participant_name: self.participant_name,
                state: Round2Done {
                    secret_package: output.secret_package,
                },
            },
            output.public_packages,
        ))
    }
}

impl DkgSession<Round2Done> {
    pub fn secret_package(&self) -> &Round2SecretPackage {
        &self.state.secret_package
    }

    /// Run round 3 and import the signer account
    pub fn round3<S: SecretStore + AccountStore + ?Sized>(
        self,
        store: &S,
        account_name: &str,
        round1_public_packages: &[Round1PublicPackage],
        round2_public_packages: &[Round2PublicPackage],
        account_created_at: Option<AccountHead>,
    ) -> Result<MultisigAccount> {
        round3(
            store,
            &self.participant_name,
            account_name,
            &self.state.secret_package,
            round1_public_packages,
            round2_public_packages,
            account_created_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ParticipantSecret;
    use crate::store::MemoryStore;

    #[test]
    fn test_session_runs_all_rounds() {
        let store = MemoryStore::new();
        let mut identities = Vec::new();
        for i in 0..3 {
            let secret = ParticipantSecret::random();
            identities.push(secret.to_identity());
            store.insert_secret(&format!("secret-{}", i), secret).unwrap();
        }
        let config = GroupConfig::new(2, identities.clone()).unwrap();

        let mut sessions = Vec::new();
        let mut round1_packages = Vec::new();
        for i in 0..3 {
            let (session, package) = DkgSession::new(&format!("secret-{}", i))
                .round1(&store, &config)
                .unwrap();
            sessions.push(session);
            round1_packages.push(package);
        }

        let mut round2_sessions = Vec::new();
        let mut round2_packages = Vec::new();
        for session in sessions {
            let (session, packages) = session.round2(&store, &round1_packages).unwrap();
            round2_sessions.push(session);
            round2_packages.extend(packages);
        }

        let mut addresses = Vec::new();
        for (i, session) in round2_sessions.into_iter().enumerate() {
            assert_eq!(session.participant_name(), format!("secret-{}", i));
            let addressed: Vec<_> = round2_packages
                .iter()
                .filter(|p| p.recipient() == &identities[i])
                .cloned()
                .collect();
            let account = session
                .round3(&store, &format!("account-{}", i), &round1_packages, &addressed, None)
                .unwrap();
            addresses.push(account.keys.public_address);
        }

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }
}
