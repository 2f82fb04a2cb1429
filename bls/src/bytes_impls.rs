//! SSZ, tree-hash and serde impls for inert fixed-size byte wrappers.

macro_rules! impl_byte_wrapper {
    ($type:ty, $size:expr, $tree_hash_vector:ty) => {
        impl Default for $type {
            fn default() -> Self {
                Self([0; $size])
            }
        }

        impl AsRef<[u8]> for $type {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $size]> for $type {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(formatter, "0x{}", alloy_primitives::hex::encode(self.0))
            }
        }

        impl core::fmt::Display for $type {
            fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                core::fmt::Debug::fmt(self, formatter)
            }
        }

        impl ssz::Encode for $type {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $size
            }

            fn ssz_bytes_len(&self) -> usize {
                $size
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl ssz::Decode for $type {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $size
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
                Self::from_bytes(bytes).map_err(|_| ssz::DecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: $size,
                })
            }
        }

        impl tree_hash::TreeHash for $type {
            fn tree_hash_type() -> tree_hash::TreeHashType {
                tree_hash::TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> tree_hash::PackedEncoding {
                unreachable!("vectors are never packed")
            }

            fn tree_hash_packing_factor() -> usize {
                unreachable!("vectors are never packed")
            }

            fn tree_hash_root(&self) -> tree_hash::Hash256 {
                let vector = <$tree_hash_vector>::try_from(self.0.to_vec())
                    .expect("byte wrapper length matches fixed vector length");
                vector.tree_hash_root()
            }
        }

        impl serde::Serialize for $type {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!(
                    "0x{}",
                    alloy_primitives::hex::encode(self.0)
                ))
            }
        }

        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                use serde::de::Error as _;

                let string = <String as serde::Deserialize>::deserialize(deserializer)?;
                let bytes =
                    alloy_primitives::hex::decode(&string).map_err(D::Error::custom)?;

                Self::from_bytes(&bytes).map_err(D::Error::custom)
            }
        }

        impl $type {
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, $crate::Error> {
                if bytes.len() != $size {
                    return Err($crate::Error::InvalidByteLength {
                        got: bytes.len(),
                        expected: $size,
                    });
                }

                let mut value = [0; $size];
                value.copy_from_slice(bytes);
                Ok(Self(value))
            }

            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            /// All zero bytes. Not a valid curve point.
            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0 == [0; $size]
            }
        }
    };
}

pub(crate) use impl_byte_wrapper;
