//! The chain's deterministic shuffling rules, consumed as a pure-function
//! dependency.
//!
//! Committee assignment math lives in `helper_functions::accessors`; the
//! permutation it slices and the proposer sampling it reports are supplied by
//! an implementation of [`Shuffling`]. Implementations must be deterministic:
//! the same state and epoch always produce the same ordering.

use anyhow::Result;
use types::{
    combined::BeaconState,
    phase0::primitives::{Epoch, Slot, ValidatorIndex},
};

pub trait Shuffling: Send + Sync {
    /// Active validator indices for `epoch`, permuted by the swap-or-not
    /// shuffle seeded from the state's randao mixes.
    ///
    /// `epoch` may be one greater than the state's own epoch. That is the
    /// lookahead case: assignments for the next epoch computed from the
    /// current epoch's state.
    fn epoch_shuffling(&self, state: &BeaconState, epoch: Epoch) -> Result<Vec<ValidatorIndex>>;

    /// The proposer for `slot`, sampled with effective-balance weighting from
    /// the same seed material.
    fn proposer_index(&self, state: &BeaconState, slot: Slot) -> Result<ValidatorIndex>;
}
