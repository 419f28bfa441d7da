//! Multisig Party CLI
//!
//! Command-line interface for one multisig participant or coordinator:
//! - Participant identities
//! - Group setup through a trusted dealer or DKG rounds 1-3
//! - Signing commitments, signing packages, signature shares, aggregation
//!
//! Every command is one RPC call against the file store in `--data-dir`;
//! the JSON response is printed to stdout and logs go to stderr.

mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use multisig_core::AccountHead;
use multisig_rpc::messages::*;
use multisig_rpc::RpcHandler;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use store::FileStore;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Multisig Party - FROST threshold signing node
#[derive(Parser)]
#[command(name = "multisig-party")]
#[command(about = "FROST multisig participant and coordinator")]
#[command(version)]
struct Cli {
    /// Data directory for participant secrets and accounts
    #[arg(short, long, env = "MULTISIG_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Emit logs as JSON
    #[arg(long, env = "MULTISIG_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a named participant identity
    CreateParticipant {
        #[arg(short, long)]
        name: String,
    },

    /// Show a participant's identity
    GetIdentity {
        #[arg(short, long)]
        name: String,
    },

    /// List every stored participant
    GetIdentities,

    /// Split a fresh group key among participants
    CreateTrustedDealerKeyPackage {
        /// Threshold
        #[arg(short, long)]
        min_signers: u16,

        /// Participant identities (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        participants: Vec<String>,
    },

    /// DKG round 1
    DkgRound1 {
        #[arg(long)]
        participant_name: String,

        #[arg(short, long)]
        min_signers: u16,

        /// Participant identities (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        participants: Vec<String>,
    },

    /// DKG round 2
    DkgRound2 {
        #[arg(long)]
        participant_name: String,

        #[arg(long)]
        round1_secret_package: String,

        /// Round 1 public packages of every participant, ours included
        #[arg(long, value_delimiter = ',')]
        round1_public_packages: Vec<String>,
    },

    /// DKG round 3; creates the account
    DkgRound3 {
        #[arg(long)]
        participant_name: String,

        #[arg(long)]
        account_name: String,

        #[arg(long)]
        round2_secret_package: String,

        #[arg(long, value_delimiter = ',')]
        round1_public_packages: Vec<String>,

        /// Round 2 public packages addressed to us
        #[arg(long, value_delimiter = ',')]
        round2_public_packages: Vec<String>,

        /// Block sequence to start scanning from
        #[arg(long, requires = "created_at_hash")]
        created_at_sequence: Option<u32>,

        #[arg(long, requires = "created_at_sequence")]
        created_at_hash: Option<String>,
    },

    /// Import an account payload
    ImportAccount {
        #[arg(short, long)]
        name: Option<String>,

        /// Hex import payload
        #[arg(short, long)]
        account: String,

        /// Block sequence to start scanning from
        #[arg(long, requires = "created_at_hash")]
        created_at_sequence: Option<u32>,

        #[arg(long, requires = "created_at_sequence")]
        created_at_hash: Option<String>,
    },

    /// Export an account payload
    ExportAccount {
        #[arg(short, long)]
        account: String,
    },

    /// List the identities of an account's group
    GetAccountIdentities {
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Show a signer account's own identity
    GetAccountIdentity {
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Commit to nonces for a transaction and signer set
    CreateSigningCommitment {
        #[arg(short, long)]
        account: String,

        /// Unsigned transaction (hex)
        #[arg(short, long)]
        unsigned_transaction: String,

        /// Signer identities (hex, comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        signers: Vec<String>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build a signing package from commitments
    CreateSigningPackage {
        #[arg(short, long)]
        account: Option<String>,

        #[arg(short, long, value_delimiter = ',')]
        commitments: Vec<String>,

        #[arg(short, long)]
        unsigned_transaction: String,
    },

    /// Produce this account's signature share
    CreateSignatureShare {
        #[arg(short, long)]
        account: String,

        #[arg(short, long)]
        signing_package: String,
    },

    /// Aggregate signature shares into a signed transaction
    AggregateSignatureShares {
        #[arg(short, long)]
        account: String,

        #[arg(short, long)]
        signing_package: String,

        #[arg(long, value_delimiter = ',')]
        signature_shares: Vec<String>,
    },

    /// Check a signed transaction against an account's group key
    VerifySignature {
        #[arg(short, long)]
        account: Option<String>,

        /// Signed transaction (hex)
        #[arg(short, long)]
        transaction: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let store = FileStore::open(&cli.data_dir)?;
    info!(data_dir = ?store.root(), "Data directory ready");
    let handler = RpcHandler::with_store(store);

    let (method, params) = request(cli.command)?;
    let response = handler.handle(method, params)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Method name and JSON params for a command
fn request(command: Commands) -> Result<(&'static str, Value)> {
    Ok(match command {
        Commands::CreateParticipant { name } => (
            methods::CREATE_PARTICIPANT,
            params(CreateParticipantRequest { name })?,
        ),
        Commands::GetIdentity { name } => {
            (methods::GET_IDENTITY, params(GetIdentityRequest { name })?)
        }
        Commands::GetIdentities => (methods::GET_IDENTITIES, params(GetIdentitiesRequest {})?),
        Commands::CreateTrustedDealerKeyPackage {
            min_signers,
            participants,
        } => (
            methods::CREATE_TRUSTED_DEALER_KEY_PACKAGE,
            params(CreateTrustedDealerKeyPackageRequest {
                min_signers,
                participants: entries(participants),
            })?,
        ),
        Commands::DkgRound1 {
            participant_name,
            min_signers,
            participants,
        } => (
            methods::DKG_ROUND1,
            params(DkgRound1Request {
                participant_name,
                min_signers,
                participants: entries(participants),
            })?,
        ),
        Commands::DkgRound2 {
            participant_name,
            round1_secret_package,
            round1_public_packages,
        } => (
            methods::DKG_ROUND2,
            params(DkgRound2Request {
                participant_name,
                round1_secret_package,
                round1_public_packages,
            })?,
        ),
        Commands::DkgRound3 {
            participant_name,
            account_name,
            round2_secret_package,
            round1_public_packages,
            round2_public_packages,
            created_at_sequence,
            created_at_hash,
        } => (
            methods::DKG_ROUND3,
            params(DkgRound3Request {
                participant_name,
                account_name,
                round2_secret_package,
                round1_public_packages,
                round2_public_packages,
                account_created_at: account_head(created_at_sequence, created_at_hash),
            })?,
        ),
        Commands::ImportAccount {
            name,
            account,
            created_at_sequence,
            created_at_hash,
        } => (
            methods::IMPORT_ACCOUNT,
            params(ImportAccountRequest {
                name,
                account,
                account_created_at: account_head(created_at_sequence, created_at_hash),
            })?,
        ),
        Commands::ExportAccount { account } => {
            (methods::EXPORT_ACCOUNT, params(ExportAccountRequest { account })?)
        }
        Commands::GetAccountIdentities { account } => (
            methods::GET_ACCOUNT_IDENTITIES,
            params(GetAccountIdentitiesRequest { account })?,
        ),
        Commands::GetAccountIdentity { account } => (
            methods::GET_ACCOUNT_IDENTITY,
            params(GetAccountIdentityRequest { account })?,
        ),
        Commands::CreateSigningCommitment {
            account,
            unsigned_transaction,
            signers,
            seed,
        } => (
            methods::CREATE_SIGNING_COMMITMENT,
            params(CreateSigningCommitmentRequest {
                account,
                unsigned_transaction,
                signers: entries(signers),
                seed,
            })?,
        ),
        Commands::CreateSigningPackage {
            account,
            commitments,
            unsigned_transaction,
        } => (
            methods::CREATE_SIGNING_PACKAGE,
            params(CreateSigningPackageRequest {
                account,
                commitments,
                unsigned_transaction,
            })?,
        ),
        Commands::CreateSignatureShare {
            account,
            signing_package,
        } => (
            methods::CREATE_SIGNATURE_SHARE,
            params(CreateSignatureShareRequest {
                account,
                signing_package,
            })?,
        ),
        Commands::AggregateSignatureShares {
            account,
            signing_package,
            signature_shares,
        } => (
            methods::AGGREGATE_SIGNATURE_SHARES,
            params(AggregateSignatureSharesRequest {
                account,
                signing_package,
                signature_shares,
            })?,
        ),
        Commands::VerifySignature {
            account,
            transaction,
        } => (
            methods::VERIFY_SIGNATURE,
            params(VerifySignatureRequest {
                account,
                transaction,
            })?,
        ),
    })
}

fn params<T: Serialize>(request: T) -> Result<Value> {
    Ok(serde_json::to_value(request)?)
}

fn entries(identities: Vec<String>) -> Vec<ParticipantEntry> {
    identities.into_iter().map(ParticipantEntry::from).collect()
}

fn account_head(sequence: Option<u32>, hash: Option<String>) -> Option<AccountHead> {
    Some(AccountHead {
        sequence: sequence?,
        hash: hash?,
    })
}
