use thiserror::Error;
use types::phase0::primitives::{Slot, ValidatorIndex};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("committee index {committee_index} is out of bounds for {committees_at_slot} committees")]
    CommitteeIndexOutOfBounds {
        committee_index: u64,
        committees_at_slot: u64,
    },
    #[error("slot {slot} is out of range for state at slot {state_slot}")]
    SlotOutOfRange { slot: Slot, state_slot: Slot },
    #[error("state has no sync committee before Altair")]
    StatePreAltair,
    #[error("subcommittee index {0} is out of bounds")]
    SubcommitteeIndexOutOfBounds(u64),
    #[error("validator index {0} is out of bounds")]
    ValidatorIndexOutOfBounds(ValidatorIndex),
}
