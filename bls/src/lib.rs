//! Byte forms and aggregation for BLS12-381 values, backed by `blst`.
//!
//! Container types store compressed bytes and only decompress at the point of
//! aggregation. Signature *verification* belongs to collaborators outside
//! this workspace.

pub use crate::{
    error::Error, public_key_bytes::PublicKeyBytes, signature::Signature,
    signature_bytes::SignatureBytes,
};

pub type AggregateSignature = Signature;
pub type AggregateSignatureBytes = SignatureBytes;

mod error;
mod public_key_bytes;
mod signature;
mod signature_bytes;

pub(crate) mod bytes_impls;
