use types::{
    altair::{containers::SyncCommitteeContribution, primitives::SubcommitteeIndex},
    phase0::primitives::{Slot, H256},
};

/// Key identifying the contribution a sync committee message belongs to.
/// Ordered by slot first so slot-based eviction can split the map.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContributionData {
    pub slot: Slot,
    pub beacon_block_root: H256,
    pub subcommittee_index: SubcommitteeIndex,
}

impl ContributionData {
    #[must_use]
    pub const fn first_in_slot(slot: Slot) -> Self {
        Self {
            slot,
            beacon_block_root: H256::ZERO,
            subcommittee_index: 0,
        }
    }
}

impl From<&SyncCommitteeContribution> for ContributionData {
    fn from(contribution: &SyncCommitteeContribution) -> Self {
        let SyncCommitteeContribution {
            slot,
            beacon_block_root,
            subcommittee_index,
            ..
        } = *contribution;

        Self {
            slot,
            beacon_block_root,
            subcommittee_index,
        }
    }
}
