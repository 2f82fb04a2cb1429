use crate::phase0::primitives::{Epoch, Slot};

pub const ATTESTATION_PROPAGATION_SLOT_RANGE: u64 = 32;
pub const ATTESTATION_SUBNET_COUNT: u64 = 64;
pub const FAR_FUTURE_EPOCH: Epoch = Epoch::MAX;
pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
