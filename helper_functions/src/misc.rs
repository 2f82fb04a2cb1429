use core::ops::Range;

use types::{
    altair::primitives::{SubcommitteeIndex, SyncCommitteePeriod},
    phase0::{
        consts::{ATTESTATION_PROPAGATION_SLOT_RANGE, ATTESTATION_SUBNET_COUNT},
        primitives::{CommitteeIndex, Epoch, Slot, SubnetId},
    },
    preset::{
        EPOCHS_PER_SYNC_COMMITTEE_PERIOD, MAX_COMMITTEES_PER_SLOT, SLOTS_PER_EPOCH,
        SYNC_SUBCOMMITTEE_SIZE, TARGET_COMMITTEE_SIZE,
    },
};

use crate::error::Error;

#[must_use]
pub const fn compute_epoch_at_slot(slot: Slot) -> Epoch {
    slot / SLOTS_PER_EPOCH
}

#[must_use]
pub const fn compute_start_slot_at_epoch(epoch: Epoch) -> Slot {
    epoch * SLOTS_PER_EPOCH
}

#[must_use]
pub const fn is_epoch_start(slot: Slot) -> bool {
    slot % SLOTS_PER_EPOCH == 0
}

#[must_use]
pub const fn previous_epoch(epoch: Epoch) -> Epoch {
    epoch.saturating_sub(1)
}

#[must_use]
pub const fn slots_in_epoch(epoch: Epoch) -> Range<Slot> {
    let start = compute_start_slot_at_epoch(epoch);
    start..start + SLOTS_PER_EPOCH
}

#[must_use]
pub const fn sync_committee_period(epoch: Epoch) -> SyncCommitteePeriod {
    epoch / EPOCHS_PER_SYNC_COMMITTEE_PERIOD
}

#[must_use]
pub const fn sync_committee_period_start_epoch(epoch: Epoch) -> Epoch {
    sync_committee_period(epoch) * EPOCHS_PER_SYNC_COMMITTEE_PERIOD
}

/// The last epoch for which sync committee duties can be answered: the final
/// epoch of the *next* sync committee period.
#[must_use]
pub const fn sync_committee_duties_last_valid_epoch(current_epoch: Epoch) -> Epoch {
    (sync_committee_period(current_epoch) + 2) * EPOCHS_PER_SYNC_COMMITTEE_PERIOD - 1
}

/// `get_committee_count_per_slot` from the Phase 0 specification, as a
/// function of the active validator count.
#[must_use]
pub const fn committee_count_from_active_validator_count(active_validator_count: u64) -> u64 {
    let count = active_validator_count / SLOTS_PER_EPOCH / TARGET_COMMITTEE_SIZE;

    if count == 0 {
        1
    } else if count > MAX_COMMITTEES_PER_SLOT {
        MAX_COMMITTEES_PER_SLOT
    } else {
        count
    }
}

pub fn compute_subnet_for_attestation(
    committees_at_slot: u64,
    slot: Slot,
    committee_index: CommitteeIndex,
) -> Result<SubnetId, Error> {
    if committee_index >= committees_at_slot {
        return Err(Error::CommitteeIndexOutOfBounds {
            committee_index,
            committees_at_slot,
        });
    }

    let slots_since_epoch_start = slot % SLOTS_PER_EPOCH;
    let committees_since_epoch_start = committees_at_slot * slots_since_epoch_start;

    Ok((committees_since_epoch_start + committee_index) % ATTESTATION_SUBNET_COUNT)
}

/// The sync committee subnet carrying messages from a given position in the
/// full 512-entry committee.
#[must_use]
pub const fn compute_subnet_for_sync_committee_position(position: u64) -> SubnetId {
    position / SYNC_SUBCOMMITTEE_SIZE
}

#[must_use]
pub const fn subcommittee_position_range(subcommittee_index: SubcommitteeIndex) -> Range<u64> {
    let start = subcommittee_index * SYNC_SUBCOMMITTEE_SIZE;
    start..start + SYNC_SUBCOMMITTEE_SIZE
}

/// Whether an attestation for `attestation_slot` may still be broadcast at
/// `current_slot`. One slot of tolerance in the future direction absorbs
/// clock disparity between peers.
#[must_use]
pub const fn attestation_slot_is_timely(attestation_slot: Slot, current_slot: Slot) -> bool {
    attestation_slot + ATTESTATION_PROPAGATION_SLOT_RANGE >= current_slot
        && attestation_slot <= current_slot + 1
}
