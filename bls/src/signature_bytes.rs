use ssz_types::{typenum::U96, FixedVector};

use crate::bytes_impls::impl_byte_wrapper;

pub const SIGNATURE_BYTES_LEN: usize = 96;

/// A compressed signature that has not been checked for validity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignatureBytes(pub(crate) [u8; SIGNATURE_BYTES_LEN]);

impl_byte_wrapper!(SignatureBytes, SIGNATURE_BYTES_LEN, FixedVector<u8, U96>);

impl SignatureBytes {
    /// The compressed encoding of the point at infinity.
    #[must_use]
    pub fn empty() -> Self {
        let mut bytes = [0; SIGNATURE_BYTES_LEN];
        bytes[0] = 0xc0;
        Self(bytes)
    }
}
