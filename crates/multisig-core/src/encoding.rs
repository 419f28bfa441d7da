//! Byte encodings shared by packages, accounts and the RPC boundary
//!
//! Binary fields serialize as hex strings in human-readable formats (JSON)
//! and as raw bytes otherwise. Opaque protocol values are bincode encodings
//! behind a one-byte version prefix, hex-encoded when they leave the node.

use crate::{Error, Result};
use frost_ed25519 as frost;
use serde::{de::DeserializeOwned, Serialize};

/// Version prefix of every opaque encoding
pub const ENCODING_VERSION: u8 = 1;

/// A protocol value handed to callers as an opaque byte string
pub trait Opaque: Serialize + DeserializeOwned {
    /// Encode to versioned bytes
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(ENCODING_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode from versioned bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| Error::Deserialization("empty input".into()))?;
        if *version != ENCODING_VERSION {
            return Err(Error::Deserialization(format!(
                "unsupported encoding version {}",
                version
            )));
        }
        let (value, read): (Self, usize) =
            bincode::serde::decode_from_slice(body, bincode::config::standard())
                .map_err(|e| Error::Deserialization(e.to_string()))?;
        if read != body.len() {
            return Err(Error::Deserialization(format!(
                "{} trailing bytes",
                body.len() - read
            )));
        }
        Ok(value)
    }

    /// Encode to a hex string
    fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Decode from a hex string
    fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

/// Canonical byte form of a FROST object
pub trait FrostCodec: Sized {
    fn encode(&self) -> Result<Vec<u8>>;
    fn decode(bytes: &[u8]) -> Result<Self>;
}

macro_rules! frost_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FrostCodec for $ty {
                fn encode(&self) -> Result<Vec<u8>> {
                    self.serialize()
                        .map_err(|e| Error::Serialization(e.to_string()))
                }

                fn decode(bytes: &[u8]) -> Result<Self> {
                    <$ty>::deserialize(bytes)
                        .map_err(|e| Error::Deserialization(e.to_string()))
                }
            }
        )*
    };
}

frost_codec!(
    frost::keys::KeyPackage,
    frost::keys::PublicKeyPackage,
    frost::keys::dkg::round1::Package,
    frost::keys::dkg::round2::Package,
    frost::round1::SigningCommitments,
    frost::SigningPackage,
    frost::Signature,
);

impl FrostCodec for frost::round2::SignatureShare {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.serialize())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        frost::round2::SignatureShare::deserialize(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Serialize `Vec<u8>` as hex (human-readable) or bytes
pub mod hex_bytes {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BytesVisitor)
        } else {
            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a hex string or a byte array")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            hex::decode(v).map_err(E::custom)
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element()? {
                bytes.push(b);
            }
            Ok(bytes)
        }
    }
}

/// Serialize `[u8; N]` the same way as [`hex_bytes`]
pub mod hex_array {
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::hex_bytes::serialize(bytes, serializer)
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = super::hex_bytes::deserialize(deserializer)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| de::Error::invalid_length(len, &"a fixed-size byte array"))
    }
}

/// Serialize a FROST object through its canonical bytes
pub mod frost_serde {
    use super::FrostCodec;
    use serde::{de, ser, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: FrostCodec,
        S: Serializer,
    {
        let bytes = value.encode().map_err(ser::Error::custom)?;
        super::hex_bytes::serialize(&bytes, serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FrostCodec,
        D: Deserializer<'de>,
    {
        let bytes = super::hex_bytes::deserialize(deserializer)?;
        T::decode(&bytes).map_err(de::Error::custom)
    }
}
