//! # Multisig Core
//!
//! Threshold (FROST) multisig accounts for a shielded-transaction node.
//!
//! This crate provides:
//! - Participant identities and secrets, and the stores that hold them
//! - Group setup through a trusted dealer or a 3-round DKG
//! - Account key derivation from a group's key material
//! - Signing: commitments, signing packages, signature shares, aggregation
//!
//! ## Example
//!
//! ```rust,ignore
//! use multisig_core::{dealer, sign, store::MemoryStore, RawTransactionCodec};
//!
//! let packages = dealer::create_trusted_dealer_key_package(&config)?;
//! let commitment = sign::create_signing_commitment(&store, &RawTransactionCodec, "account", &tx, &signers, None)?;
//! let package = sign::create_signing_package(&store, &RawTransactionCodec, None, &commitments, &tx)?;
//! let share = sign::create_signature_share(&store, &RawTransactionCodec, "account", &package)?;
//! let signed = sign::aggregate_signature_shares(&store, &RawTransactionCodec, "coordinator", &package, &shares)?;
//! ```

pub mod account;
pub mod dealer;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod keygen;
pub mod keys;
pub mod participant;
pub mod sign;
pub mod store;
pub mod transaction;
pub mod types;

pub use account::{AccountImport, AccountRole, MultisigAccount, MultisigGroup};
pub use encoding::Opaque;
pub use error::{Error, ErrorKind, Result};
pub use keys::AccountKeys;
pub use participant::{ParticipantIdentity, ParticipantSecret};
pub use transaction::{RawTransactionCodec, TransactionCodec};
pub use types::{AccountHead, GroupConfig, MIN_SIGNERS_FLOOR};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
