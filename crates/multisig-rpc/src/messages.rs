//! Request and response bodies
//!
//! Field names are camelCase. Binary values are hex strings: identities,
//! opaque packages, transactions and keys.

use multisig_core::AccountHead;
use serde::{Deserialize, Serialize};

/// Method names accepted by [`crate::RpcHandler::handle`]
pub mod methods {
    pub const CREATE_PARTICIPANT: &str = "multisig/createParticipant";
    pub const GET_IDENTITY: &str = "multisig/getIdentity";
    pub const GET_IDENTITIES: &str = "multisig/getIdentities";
    pub const CREATE_TRUSTED_DEALER_KEY_PACKAGE: &str = "multisig/createTrustedDealerKeyPackage";
    pub const DKG_ROUND1: &str = "multisig/dkg/round1";
    pub const DKG_ROUND2: &str = "multisig/dkg/round2";
    pub const DKG_ROUND3: &str = "multisig/dkg/round3";
    pub const IMPORT_ACCOUNT: &str = "multisig/importAccount";
    pub const EXPORT_ACCOUNT: &str = "multisig/exportAccount";
    pub const GET_ACCOUNT_IDENTITIES: &str = "multisig/getAccountIdentities";
    pub const GET_ACCOUNT_IDENTITY: &str = "multisig/getAccountIdentity";
    pub const CREATE_SIGNING_COMMITMENT: &str = "multisig/createSigningCommitment";
    pub const CREATE_SIGNING_PACKAGE: &str = "multisig/createSigningPackage";
    pub const CREATE_SIGNATURE_SHARE: &str = "multisig/createSignatureShare";
    pub const AGGREGATE_SIGNATURE_SHARES: &str = "multisig/aggregateSignatureShares";
    pub const VERIFY_SIGNATURE: &str = "multisig/verifySignature";
}

/// A participant reference inside a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    pub identity: String,
}

impl From<String> for ParticipantEntry {
    fn from(identity: String) -> Self {
        Self { identity }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantResponse {
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIdentityRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIdentityResponse {
    pub identity: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIdentitiesRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedIdentity {
    pub name: String,
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIdentitiesResponse {
    pub identities: Vec<NamedIdentity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrustedDealerKeyPackageRequest {
    pub min_signers: u16,
    pub participants: Vec<ParticipantEntry>,
}

/// Import payload for one participant of a dealer group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAccount {
    pub identity: String,
    pub account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrustedDealerKeyPackageResponse {
    pub public_address: String,
    pub public_key_package: String,
    pub view_key: String,
    pub incoming_view_key: String,
    pub outgoing_view_key: String,
    pub proof_authorizing_key: String,
    pub participant_accounts: Vec<ParticipantAccount>,
    pub coordinator_account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound1Request {
    pub participant_name: String,
    pub min_signers: u16,
    pub participants: Vec<ParticipantEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound1Response {
    pub round1_secret_package: String,
    pub round1_public_package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound2Request {
    pub participant_name: String,
    pub round1_secret_package: String,
    pub round1_public_packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound2Response {
    pub round2_secret_package: String,
    pub round2_public_packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound3Request {
    pub participant_name: String,
    pub account_name: String,
    pub round2_secret_package: String,
    pub round1_public_packages: Vec<String>,
    pub round2_public_packages: Vec<String>,
    #[serde(default)]
    pub account_created_at: Option<AccountHead>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkgRound3Response {
    pub name: String,
    pub public_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAccountRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub account: String,
    #[serde(default)]
    pub account_created_at: Option<AccountHead>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAccountResponse {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAccountRequest {
    pub account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAccountResponse {
    pub account: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountIdentitiesRequest {
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountIdentitiesResponse {
    pub identities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountIdentityRequest {
    #[serde(default)]
    pub account: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountIdentityResponse {
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSigningCommitmentRequest {
    pub account: String,
    pub unsigned_transaction: String,
    pub signers: Vec<ParticipantEntry>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// The opaque `commitment` plus its FROST hiding and binding parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSigningCommitmentResponse {
    pub commitment: String,
    pub hiding: String,
    pub binding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSigningPackageRequest {
    #[serde(default)]
    pub account: Option<String>,
    pub commitments: Vec<String>,
    pub unsigned_transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSigningPackageResponse {
    pub signing_package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignatureShareRequest {
    pub account: String,
    pub signing_package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignatureShareResponse {
    pub signature_share: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSignatureSharesRequest {
    pub account: String,
    pub signing_package: String,
    pub signature_shares: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSignatureSharesResponse {
    pub transaction: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureRequest {
    #[serde(default)]
    pub account: Option<String>,
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureResponse {
    pub valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requests_use_camel_case() {
        let request: DkgRound3Request = serde_json::from_value(json!({
            "participantName": "alice",
            "accountName": "shared",
            "round2SecretPackage": "01",
            "round1PublicPackages": ["02"],
            "round2PublicPackages": [],
            "accountCreatedAt": { "sequence": 7, "hash": "ab" }
        }))
        .unwrap();
        assert_eq!(request.participant_name, "alice");
        assert_eq!(request.account_created_at.unwrap().sequence, 7);
    }

    #[test]
    fn test_optional_fields_default() {
        let request: CreateSigningPackageRequest = serde_json::from_value(json!({
            "commitments": [],
            "unsignedTransaction": "00"
        }))
        .unwrap();
        assert!(request.account.is_none());

        let request: CreateSigningCommitmentRequest = serde_json::from_value(json!({
            "account": "a",
            "unsignedTransaction": "00",
            "signers": [{ "identity": "ff" }]
        }))
        .unwrap();
        assert!(request.seed.is_none());
        assert_eq!(request.signers[0].identity, "ff");
    }

    #[test]
    fn test_response_field_names() {
        let value = serde_json::to_value(DkgRound1Response {
            round1_secret_package: "aa".into(),
            round1_public_package: "bb".into(),
        })
        .unwrap();
        assert_eq!(value["round1SecretPackage"], "aa");
        assert_eq!(value["round1PublicPackage"], "bb");
    }
}
