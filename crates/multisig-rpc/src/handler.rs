//! Transport-agnostic request handler

use crate::error::{RpcError, RpcResult};
use crate::messages::*;
use multisig_core::dealer::create_trusted_dealer_key_package;
use multisig_core::encoding::FrostCodec;
use multisig_core::keygen::{
    self, Round1PublicPackage, Round1SecretPackage, Round2PublicPackage, Round2SecretPackage,
};
use multisig_core::sign::{self, SignatureShare, SigningCommitment, SigningPackage};
use multisig_core::store::{resolve_account, AccountStore, SecretStore};
use multisig_core::{
    AccountImport, Error, GroupConfig, Opaque, ParticipantIdentity, ParticipantSecret,
    RawTransactionCodec, TransactionCodec,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Serves every multisig call against one store and transaction codec
pub struct RpcHandler<S, C = RawTransactionCodec> {
    store: S,
    codec: C,
}

impl<S> RpcHandler<S, RawTransactionCodec>
where
    S: SecretStore + AccountStore,
{
    /// Handler using the raw transaction codec
    pub fn with_store(store: S) -> Self {
        Self::new(store, RawTransactionCodec)
    }
}

impl<S, C> RpcHandler<S, C>
where
    S: SecretStore + AccountStore,
    C: TransactionCodec,
{
    pub fn new(store: S, codec: C) -> Self {
        Self { store, codec }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dispatch a JSON call by method name
    #[instrument(skip(self, params))]
    pub fn handle(&self, method: &str, params: Value) -> RpcResult<Value> {
        debug!("handling request");
        let result = match method {
            methods::CREATE_PARTICIPANT => call(params, |r| self.create_participant(r)),
            methods::GET_IDENTITY => call(params, |r| self.get_identity(r)),
            methods::GET_IDENTITIES => call(params, |r| self.get_identities(r)),
            methods::CREATE_TRUSTED_DEALER_KEY_PACKAGE => {
                call(params, |r| self.create_trusted_dealer_key_package(r))
            }
            methods::DKG_ROUND1 => call(params, |r| self.dkg_round1(r)),
            methods::DKG_ROUND2 => call(params, |r| self.dkg_round2(r)),
            methods::DKG_ROUND3 => call(params, |r| self.dkg_round3(r)),
            methods::IMPORT_ACCOUNT => call(params, |r| self.import_account(r)),
            methods::EXPORT_ACCOUNT => call(params, |r| self.export_account(r)),
            methods::GET_ACCOUNT_IDENTITIES => call(params, |r| self.get_account_identities(r)),
            methods::GET_ACCOUNT_IDENTITY => call(params, |r| self.get_account_identity(r)),
            methods::CREATE_SIGNING_COMMITMENT => {
                call(params, |r| self.create_signing_commitment(r))
            }
            methods::CREATE_SIGNING_PACKAGE => call(params, |r| self.create_signing_package(r)),
            methods::CREATE_SIGNATURE_SHARE => call(params, |r| self.create_signature_share(r)),
            methods::AGGREGATE_SIGNATURE_SHARES => {
                call(params, |r| self.aggregate_signature_shares(r))
            }
            methods::VERIFY_SIGNATURE => call(params, |r| self.verify_signature(r)),
            _ => Err(RpcError::unknown_method(method)),
        };

        if let Err(e) = &result {
            if e.is_client_error() {
                warn!(code = %e.code, error = %e.message, "request rejected");
            } else {
                tracing::error!(code = %e.code, error = %e.message, "request failed");
            }
        }
        result
    }

    pub fn create_participant(&self, request: CreateParticipantRequest) -> RpcResult<CreateParticipantResponse> {
        if request.name.trim().is_empty() {
            return Err(Error::Validation("participant name must not be empty".into()).into());
        }
        let secret = ParticipantSecret::random();
        let identity = secret.to_identity();
        self.store.insert_secret(&request.name, secret)?;

        info!(name = %request.name, identity = identity.short(), "Participant created");
        Ok(CreateParticipantResponse {
            identity: identity.to_hex(),
        })
    }

    pub fn get_identity(&self, request: GetIdentityRequest) -> RpcResult<GetIdentityResponse> {
        let secret = self.store.get_secret(&request.name)?;
        Ok(GetIdentityResponse {
            identity: secret.to_identity().to_hex(),
        })
    }

    pub fn get_identities(&self, _request: GetIdentitiesRequest) -> RpcResult<GetIdentitiesResponse> {
        let identities = self
            .store
            .list_secrets()?
            .into_iter()
            .map(|(name, secret)| NamedIdentity {
                name,
                identity: secret.to_identity().to_hex(),
            })
            .collect();
        Ok(GetIdentitiesResponse { identities })
    }

    pub fn create_trusted_dealer_key_package(
        &self,
        request: CreateTrustedDealerKeyPackageRequest,
    ) -> RpcResult<CreateTrustedDealerKeyPackageResponse> {
        let config = GroupConfig::new(request.min_signers, parse_identities(&request.participants)?)?;
        let packages = create_trusted_dealer_key_package(&config)?;

        let participant_accounts = packages
            .participant_imports()
            .into_iter()
            .map(|(identity, import)| {
                Ok(ParticipantAccount {
                    identity: identity.to_hex(),
                    account: import.to_hex()?,
                })
            })
            .collect::<RpcResult<Vec<_>>>()?;

        let keys = &packages.keys;
        Ok(CreateTrustedDealerKeyPackageResponse {
            public_address: keys.public_address_hex(),
            public_key_package: hex::encode(packages.group.public_key_package.encode()?),
            view_key: hex::encode(&keys.view_key),
            incoming_view_key: hex::encode(keys.incoming_view_key),
            outgoing_view_key: hex::encode(keys.outgoing_view_key),
            proof_authorizing_key: hex::encode(keys.proof_authorizing_key),
            participant_accounts,
            coordinator_account: packages.coordinator_import().to_hex()?,
        })
    }

    pub fn dkg_round1(&self, request: DkgRound1Request) -> RpcResult<DkgRound1Response> {
        let config = GroupConfig::new(request.min_signers, parse_identities(&request.participants)?)?;
        let output = keygen::round1(&self.store, &request.participant_name, &config)?;
        Ok(DkgRound1Response {
            round1_secret_package: output.secret_package.to_hex()?,
            round1_public_package: output.public_package.to_hex()?,
        })
    }

    pub fn dkg_round2(&self, request: DkgRound2Request) -> RpcResult<DkgRound2Response> {
        let secret_package = Round1SecretPackage::from_hex(&request.round1_secret_package)?;
        let public_packages = decode_all::<Round1PublicPackage>(&request.round1_public_packages)?;

        let output = keygen::round2(
            &self.store,
            &request.participant_name,
            &secret_package,
            &public_packages,
        )?;
        Ok(DkgRound2Response {
            round2_secret_package: output.secret_package.to_hex()?,
            round2_public_packages: encode_all(&output.public_packages)?,
        })
    }

    pub fn dkg_round3(&self, request: DkgRound3Request) -> RpcResult<DkgRound3Response> {
        let secret_package = Round2SecretPackage::from_hex(&request.round2_secret_package)?;
        let round1 = decode_all::<Round1PublicPackage>(&request.round1_public_packages)?;
        let round2 = decode_all::<Round2PublicPackage>(&request.round2_public_packages)?;

        let account = keygen::round3(
            &self.store,
            &request.participant_name,
            &request.account_name,
            &secret_package,
            &round1,
            &round2,
            request.account_created_at,
        )?;
        Ok(DkgRound3Response {
            name: account.name,
            public_address: account.keys.public_address_hex(),
        })
    }

    pub fn import_account(&self, request: ImportAccountRequest) -> RpcResult<ImportAccountResponse> {
        let import = AccountImport::from_hex(&request.account)?;
        let secret = match &import.signer {
            Some(signer) => self
                .store
                .find_secret(&signer.identity)?
                .map(|(_, secret)| secret),
            None => None,
        };

        let account = import.into_account(request.name.as_deref(), secret, request.account_created_at)?;
        let name = self.store.import_account(account)?;

        info!(account = %name, "Account imported");
        Ok(ImportAccountResponse { name })
    }

    pub fn export_account(&self, request: ExportAccountRequest) -> RpcResult<ExportAccountResponse> {
        let account = self.store.get_account(&request.account)?;
        Ok(ExportAccountResponse {
            account: account.to_import().to_hex()?,
        })
    }

    pub fn get_account_identities(
        &self,
        request: GetAccountIdentitiesRequest,
    ) -> RpcResult<GetAccountIdentitiesResponse> {
        let account = resolve_account(&self.store, request.account.as_deref())?;
        Ok(GetAccountIdentitiesResponse {
            identities: account.group.participants.iter().map(|i| i.to_hex()).collect(),
        })
    }

    pub fn get_account_identity(
        &self,
        request: GetAccountIdentityRequest,
    ) -> RpcResult<GetAccountIdentityResponse> {
        let account = resolve_account(&self.store, request.account.as_deref())?;
        let (secret, _) = account.signer()?;
        Ok(GetAccountIdentityResponse {
            identity: secret.to_identity().to_hex(),
        })
    }

    pub fn create_signing_commitment(
        &self,
        request: CreateSigningCommitmentRequest,
    ) -> RpcResult<CreateSigningCommitmentResponse> {
        let unsigned_transaction = hex::decode(&request.unsigned_transaction)?;
        let signers = parse_identities(&request.signers)?;

        let commitment = sign::create_signing_commitment(
            &self.store,
            &self.codec,
            &request.account,
            &unsigned_transaction,
            &signers,
            request.seed,
        )?;
        Ok(CreateSigningCommitmentResponse {
            hiding: hex::encode(commitment.hiding),
            binding: hex::encode(commitment.binding),
            commitment: commitment.to_hex()?,
        })
    }

    pub fn create_signing_package(
        &self,
        request: CreateSigningPackageRequest,
    ) -> RpcResult<CreateSigningPackageResponse> {
        let unsigned_transaction = hex::decode(&request.unsigned_transaction)?;
        let commitments = decode_all::<SigningCommitment>(&request.commitments)?;

        let package = sign::create_signing_package(
            &self.store,
            &self.codec,
            request.account.as_deref(),
            &commitments,
            &unsigned_transaction,
        )?;
        Ok(CreateSigningPackageResponse {
            signing_package: package.to_hex()?,
        })
    }

    pub fn create_signature_share(
        &self,
        request: CreateSignatureShareRequest,
    ) -> RpcResult<CreateSignatureShareResponse> {
        let package = SigningPackage::from_hex(&request.signing_package)?;
        let share = sign::create_signature_share(&self.store, &self.codec, &request.account, &package)?;
        Ok(CreateSignatureShareResponse {
            signature_share: share.to_hex()?,
        })
    }

    pub fn aggregate_signature_shares(
        &self,
        request: AggregateSignatureSharesRequest,
    ) -> RpcResult<AggregateSignatureSharesResponse> {
        let package = SigningPackage::from_hex(&request.signing_package)?;
        let shares = decode_all::<SignatureShare>(&request.signature_shares)?;

        let signed = sign::aggregate_signature_shares(
            &self.store,
            &self.codec,
            &request.account,
            &package,
            &shares,
        )?;
        Ok(AggregateSignatureSharesResponse {
            transaction: hex::encode(&signed.transaction),
            signature: hex::encode(signed.signature),
        })
    }

    pub fn verify_signature(&self, request: VerifySignatureRequest) -> RpcResult<VerifySignatureResponse> {
        let account = resolve_account(&self.store, request.account.as_deref())?;
        let transaction = hex::decode(&request.transaction)?;

        match sign::verify_signature(&self.codec, &account, &transaction) {
            Ok(()) => Ok(VerifySignatureResponse { valid: true }),
            Err(Error::Validation(reason)) => {
                debug!(account = %account.name, %reason, "signature does not verify");
                Ok(VerifySignatureResponse { valid: false })
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn call<Req, Resp, F>(params: Value, f: F) -> RpcResult<Value>
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(Req) -> RpcResult<Resp>,
{
    let request = serde_json::from_value(params).map_err(RpcError::invalid_params)?;
    let response = f(request)?;
    serde_json::to_value(response).map_err(|e| RpcError::internal(e.to_string()))
}

fn parse_identities(entries: &[ParticipantEntry]) -> RpcResult<Vec<ParticipantIdentity>> {
    entries
        .iter()
        .map(|entry| ParticipantIdentity::from_hex(&entry.identity).map_err(RpcError::from))
        .collect()
}

fn decode_all<T: Opaque>(values: &[String]) -> RpcResult<Vec<T>> {
    values
        .iter()
        .map(|value| T::from_hex(value).map_err(RpcError::from))
        .collect()
}

fn encode_all<T: Opaque>(values: &[T]) -> RpcResult<Vec<String>> {
    values
        .iter()
        .map(|value| value.to_hex().map_err(RpcError::from))
        .collect()
}
