use ssz_types::VariableList;

use crate::preset::MaxBytesPerTransaction;

pub type Gas = u64;
pub type Transaction = VariableList<u8, MaxBytesPerTransaction>;
pub type Wei = crate::phase0::primitives::Uint256;
