use bls::PublicKeyBytes;
use types::{
    altair::primitives::SubcommitteeIndex,
    combined::BeaconState,
    phase0::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex, H256},
    preset::{SLOTS_PER_EPOCH, SLOTS_PER_HISTORICAL_ROOT},
};

use crate::{error::Error, misc};

#[must_use]
pub const fn get_current_epoch(state: &BeaconState) -> Epoch {
    misc::compute_epoch_at_slot(state.slot)
}

pub fn active_validator_indices(
    state: &BeaconState,
    epoch: Epoch,
) -> impl Iterator<Item = ValidatorIndex> + '_ {
    state
        .validators
        .iter()
        .zip(0..)
        .filter(move |(validator, _)| validator.is_active_at(epoch))
        .map(|(_, validator_index)| validator_index)
}

#[must_use]
pub fn active_validator_count(state: &BeaconState, epoch: Epoch) -> u64 {
    active_validator_indices(state, epoch).count() as u64
}

#[must_use]
pub fn get_committee_count_per_slot(state: &BeaconState, epoch: Epoch) -> u64 {
    misc::committee_count_from_active_validator_count(active_validator_count(state, epoch))
}

pub fn public_key(
    state: &BeaconState,
    validator_index: ValidatorIndex,
) -> Result<&PublicKeyBytes, Error> {
    state
        .validators
        .get(usize::try_from(validator_index).map_err(|_| {
            Error::ValidatorIndexOutOfBounds(validator_index)
        })?)
        .map(|validator| &validator.pubkey)
        .ok_or(Error::ValidatorIndexOutOfBounds(validator_index))
}

/// `get_beacon_committee` from the Phase 0 specification, operating on an
/// epoch shuffling supplied by the external shuffling dependency.
///
/// The committee for `(slot, committee_index)` is a contiguous slice of the
/// shuffled index list; only the slicing arithmetic lives here.
pub fn beacon_committee<'shuffling>(
    shuffling: &'shuffling [ValidatorIndex],
    slot: Slot,
    committee_index: CommitteeIndex,
    committees_per_slot: u64,
) -> Result<&'shuffling [ValidatorIndex], Error> {
    if committee_index >= committees_per_slot {
        return Err(Error::CommitteeIndexOutOfBounds {
            committee_index,
            committees_at_slot: committees_per_slot,
        });
    }

    let committees_in_epoch = committees_per_slot * SLOTS_PER_EPOCH;
    let index_in_epoch = (slot % SLOTS_PER_EPOCH) * committees_per_slot + committee_index;

    let total = shuffling.len() as u64;
    let start = (total * index_in_epoch / committees_in_epoch) as usize;
    let end = (total * (index_in_epoch + 1) / committees_in_epoch) as usize;

    Ok(&shuffling[start..end])
}

/// All committees of a slot, in committee-index order.
pub fn beacon_committees<'shuffling>(
    shuffling: &'shuffling [ValidatorIndex],
    slot: Slot,
    committees_per_slot: u64,
) -> impl Iterator<Item = &'shuffling [ValidatorIndex]> {
    (0..committees_per_slot).map(move |committee_index| {
        beacon_committee(shuffling, slot, committee_index, committees_per_slot)
            .expect("committee_index is below committees_per_slot")
    })
}

pub fn get_block_root_at_slot(state: &BeaconState, slot: Slot) -> Result<H256, Error> {
    if slot >= state.slot || state.slot > slot + SLOTS_PER_HISTORICAL_ROOT {
        return Err(Error::SlotOutOfRange {
            slot,
            state_slot: state.slot,
        });
    }

    let length = state.block_roots.len() as u64;
    Ok(state.block_roots[(slot % length) as usize])
}

/// The root of the block at the start of the epoch containing `state.slot`,
/// or the given head root if the state is still at the epoch start.
#[must_use]
pub fn epoch_boundary_block_root(state: &BeaconState, head_block_root: H256) -> H256 {
    let start_slot = misc::compute_start_slot_at_epoch(get_current_epoch(state));

    get_block_root_at_slot(state, start_slot).unwrap_or(head_block_root)
}

#[must_use]
pub fn get_randao_mix(state: &BeaconState, epoch: Epoch) -> H256 {
    let length = state.randao_mixes.len() as u64;
    state.randao_mixes[(epoch % length) as usize]
}

/// Public keys of one 128-wide subcommittee of the state's current sync
/// committee. A key appears once per position it occupies.
pub fn get_sync_subcommittee_pubkeys(
    state: &BeaconState,
    subcommittee_index: SubcommitteeIndex,
) -> Result<Vec<PublicKeyBytes>, Error> {
    let committee = state
        .current_sync_committee
        .as_ref()
        .ok_or(Error::StatePreAltair)?;

    let range = misc::subcommittee_position_range(subcommittee_index);
    let start = usize::try_from(range.start)
        .map_err(|_| Error::SubcommitteeIndexOutOfBounds(subcommittee_index))?;
    let end = usize::try_from(range.end)
        .map_err(|_| Error::SubcommitteeIndexOutOfBounds(subcommittee_index))?;

    committee
        .pubkeys
        .get(start..end)
        .map(<[PublicKeyBytes]>::to_vec)
        .ok_or(Error::SubcommitteeIndexOutOfBounds(subcommittee_index))
}

#[cfg(test)]
mod tests {
    use types::phase0::containers::Validator;

    use super::*;

    fn validator(pubkey_byte: u8) -> Validator {
        let mut pubkey = [0; 48];
        pubkey[0] = pubkey_byte;

        Validator {
            pubkey: pubkey.into(),
            withdrawal_credentials: H256::ZERO,
            effective_balance: 32_000_000_000,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: u64::MAX,
            withdrawable_epoch: u64::MAX,
        }
    }

    #[test]
    fn committee_slices_partition_the_shuffling() {
        let shuffling = (0..100).collect::<Vec<_>>();

        let committees = beacon_committees(&shuffling, 7, 2).collect::<Vec<_>>();

        // 100 validators, 32 slots, 2 committees per slot. Slot 7 gets the
        // slices for epoch committee indices 14 and 15.
        assert_eq!(committees.len(), 2);
        assert_eq!(committees[0], &shuffling[21..23]);
        assert_eq!(committees[1], &shuffling[23..25]);
    }

    #[test]
    fn committee_index_out_of_bounds_is_rejected() {
        let shuffling = (0..100).collect::<Vec<_>>();

        assert_eq!(
            beacon_committee(&shuffling, 0, 2, 2),
            Err(Error::CommitteeIndexOutOfBounds {
                committee_index: 2,
                committees_at_slot: 2,
            }),
        );
    }

    #[test]
    fn block_root_lookup_rejects_slots_not_covered_by_the_state() {
        let state = BeaconState {
            slot: 10,
            block_roots: vec![H256::ZERO; 16],
            ..BeaconState::default()
        };

        assert!(get_block_root_at_slot(&state, 9).is_ok());
        assert!(get_block_root_at_slot(&state, 10).is_err());
    }

    #[test]
    fn inactive_validators_are_not_counted() {
        let mut exited = validator(1);
        exited.exit_epoch = 5;

        let state = BeaconState {
            slot: 0,
            validators: vec![validator(0), exited, validator(2)],
            ..BeaconState::default()
        };

        assert_eq!(active_validator_count(&state, 10), 2);
        assert_eq!(
            active_validator_indices(&state, 10).collect::<Vec<_>>(),
            [0, 2],
        );
    }
}
