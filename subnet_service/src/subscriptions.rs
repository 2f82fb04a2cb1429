use std::collections::BTreeSet;

use bls::PublicKeyBytes;
use helper_functions::misc;
use thiserror::Error;
use types::{
    phase0::primitives::{Epoch, Slot},
    preset::EPOCHS_PER_SYNC_COMMITTEE_PERIOD,
};

use crate::{
    misc::{BeaconCommitteeSubscription, SyncCommitteeSubscription},
    subnet_tracker::SubnetTracker,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error(
        "committees_at_slot ({requested}) does not match \
         the expected number of committees ({computed})"
    )]
    CommitteesAtSlotMismatch { requested: u64, computed: u64 },
    #[error(
        "Epoch for subscription at index {index} is in the past. It must be at least {minimum}"
    )]
    SubscriptionEpochInPast { index: usize, minimum: Epoch },
    #[error(
        "Epoch for subscription at index {index} is too far in the future. \
         It can be at most {maximum}"
    )]
    SubscriptionEpochTooFar { index: usize, maximum: Epoch },
    #[error(transparent)]
    InvalidSubnet(#[from] helper_functions::error::Error),
}

/// Validates beacon committee subscriptions and records their subnets.
/// All subscriptions are validated before the first one is recorded, so a
/// rejected batch leaves the tracker unchanged.
pub fn process_beacon_committee_subscriptions(
    tracker: &SubnetTracker,
    subscriptions: &[BeaconCommitteeSubscription],
    committees_at_slot: impl Fn(Slot) -> u64,
) -> Result<(), Error> {
    let subnets = subscriptions
        .iter()
        .map(|subscription| {
            let computed = committees_at_slot(subscription.slot);
            let requested = subscription.committees_at_slot;

            if requested != computed {
                return Err(Error::CommitteesAtSlotMismatch {
                    requested,
                    computed,
                });
            }

            let subnet_id = misc::compute_subnet_for_attestation(
                requested,
                subscription.slot,
                subscription.committee_index,
            )?;

            Ok((subscription, subnet_id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (subscription, subnet_id) in subnets {
        tracker.add_attester_subnet(subscription.slot, subnet_id);

        if subscription.is_aggregator {
            tracker.add_aggregator_subnet(subscription.slot, subnet_id);
        }
    }

    Ok(())
}

/// Validates sync committee subscriptions and records the persistent subnets
/// derived from the subscribed committee positions. The caller resolves
/// validator indices to public keys beforehand.
pub fn process_sync_committee_subscriptions(
    tracker: &SubnetTracker,
    current_epoch: Epoch,
    subscriptions: &[(PublicKeyBytes, SyncCommitteeSubscription)],
) -> Result<(), Error> {
    let period_start = misc::sync_committee_period_start_epoch(current_epoch);
    let max_valid_until_epoch = period_start + EPOCHS_PER_SYNC_COMMITTEE_PERIOD * 2;

    for (index, (_, subscription)) in subscriptions.iter().enumerate() {
        if subscription.until_epoch <= current_epoch {
            return Err(Error::SubscriptionEpochInPast {
                index,
                minimum: current_epoch + 1,
            });
        }

        if subscription.until_epoch > max_valid_until_epoch {
            return Err(Error::SubscriptionEpochTooFar {
                index,
                maximum: max_valid_until_epoch,
            });
        }
    }

    for (pubkey, subscription) in subscriptions {
        let subnets = subscription
            .sync_committee_indices
            .iter()
            .copied()
            .map(misc::compute_subnet_for_sync_committee_position)
            .collect::<BTreeSet<_>>();

        tracker.add_persistent_subnets(*pubkey, subnets, subscription.until_epoch);
    }

    Ok(())
}
