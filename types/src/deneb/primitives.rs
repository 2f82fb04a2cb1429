use core::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use ssz::{Decode, DecodeError, Encode};
use ssz_types::{typenum::U48, FixedVector};
use tree_hash::{Hash256, PackedEncoding, TreeHash, TreeHashType};

use crate::preset::BytesPerBlob;

pub type Blob = Box<FixedVector<u8, BytesPerBlob>>;
pub type BlobIndex = u64;
pub type VersionedHash = crate::phase0::primitives::H256;

const KZG_BYTES_LEN: usize = 48;

// KZG commitments and proofs are inert 48-byte values here. Verifying them is
// the job of the polynomial-commitment library behind the block-construction
// collaborator.
macro_rules! kzg_bytes {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; KZG_BYTES_LEN]);

        impl Default for $name {
            fn default() -> Self {
                Self([0; KZG_BYTES_LEN])
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "0x{}", alloy_primitives::hex::encode(self.0))
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                KZG_BYTES_LEN
            }

            fn ssz_bytes_len(&self) -> usize {
                KZG_BYTES_LEN
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                KZG_BYTES_LEN
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                if bytes.len() != KZG_BYTES_LEN {
                    return Err(DecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: KZG_BYTES_LEN,
                    });
                }

                let mut value = [0; KZG_BYTES_LEN];
                value.copy_from_slice(bytes);
                Ok(Self(value))
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> PackedEncoding {
                unreachable!("vectors are never packed")
            }

            fn tree_hash_packing_factor() -> usize {
                unreachable!("vectors are never packed")
            }

            fn tree_hash_root(&self) -> Hash256 {
                let vector = FixedVector::<u8, U48>::try_from(self.0.to_vec())
                    .expect("byte wrapper length matches fixed vector length");
                vector.tree_hash_root()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!(
                    "0x{}",
                    alloy_primitives::hex::encode(self.0)
                ))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let string = String::deserialize(deserializer)?;
                let bytes = alloy_primitives::hex::decode(&string).map_err(D::Error::custom)?;

                if bytes.len() != KZG_BYTES_LEN {
                    return Err(D::Error::custom(format!(
                        "expected {KZG_BYTES_LEN} bytes, got {}",
                        bytes.len(),
                    )));
                }

                let mut value = [0; KZG_BYTES_LEN];
                value.copy_from_slice(&bytes);
                Ok(Self(value))
            }
        }
    };
}

kzg_bytes!(KzgCommitment);
kzg_bytes!(KzgProof);
