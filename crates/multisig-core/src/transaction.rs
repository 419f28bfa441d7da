//! Transaction codec seam
//!
//! The node's transaction format lives outside this crate. Signing only needs
//! a stable reference hash of an unsigned transaction and a way to attach the
//! aggregated signature.

use crate::{Error, Result};

/// Signature length attached to a transaction
pub const SIGNATURE_LEN: usize = 64;

/// Codec supplied by the node for its transaction format
pub trait TransactionCodec: Send + Sync {
    /// Stable reference hash of an unsigned transaction
    fn transaction_hash(&self, unsigned: &[u8]) -> Result<[u8; 32]>;

    /// Produce a postable transaction from an unsigned one and its signature
    fn attach_signature(&self, unsigned: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Result<Vec<u8>>;

    /// Inverse of [`TransactionCodec::attach_signature`]
    fn split_signed(&self, signed: &[u8]) -> Result<(Vec<u8>, [u8; SIGNATURE_LEN])>;
}

/// Codec for opaque transaction bytes: blake3 reference hash, signature appended
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTransactionCodec;

impl TransactionCodec for RawTransactionCodec {
    fn transaction_hash(&self, unsigned: &[u8]) -> Result<[u8; 32]> {
        if unsigned.is_empty() {
            return Err(Error::Validation("unsigned transaction is empty".into()));
        }
        Ok(*blake3::hash(unsigned).as_bytes())
    }

    fn attach_signature(&self, unsigned: &[u8], signature: &[u8; SIGNATURE_LEN]) -> Result<Vec<u8>> {
        let mut signed = Vec::with_capacity(unsigned.len() + SIGNATURE_LEN);
        signed.extend_from_slice(unsigned);
        signed.extend_from_slice(signature);
        Ok(signed)
    }

    fn split_signed(&self, signed: &[u8]) -> Result<(Vec<u8>, [u8; SIGNATURE_LEN])> {
        if signed.len() <= SIGNATURE_LEN {
            return Err(Error::Deserialization(format!(
                "signed transaction must be longer than {} bytes",
                SIGNATURE_LEN
            )));
        }
        let (unsigned, signature) = signed.split_at(signed.len() - SIGNATURE_LEN);
        let signature: [u8; SIGNATURE_LEN] = signature
            .try_into()
            .map_err(|_| Error::Internal("signature length".into()))?;
        Ok((unsigned.to_vec(), signature))
    }
}
