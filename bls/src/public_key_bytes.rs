use ssz_types::{typenum::U48, FixedVector};

use crate::bytes_impls::impl_byte_wrapper;

pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

/// A compressed public key that has not been checked for validity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKeyBytes(pub(crate) [u8; PUBLIC_KEY_BYTES_LEN]);

impl_byte_wrapper!(PublicKeyBytes, PUBLIC_KEY_BYTES_LEN, FixedVector<u8, U48>);
