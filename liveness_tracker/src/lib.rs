use std::collections::BTreeMap;

use anyhow::Result;
use bitvec::vec::BitVec;
use helper_functions::misc;
use tokio::sync::RwLock;
use types::phase0::primitives::{Epoch, Slot, ValidatorIndex};

const EPOCHS_TO_KEEP_LIVE_VALIDATORS: u64 = 2;

/// Records which validators have been observed participating recently.
///
/// Fed from attestations, block proposals and sync committee messages the
/// node sees. Only the current and previous epoch are tracked; everything
/// else is pruned.
#[derive(Default)]
pub struct LivenessTracker {
    live_validators: RwLock<BTreeMap<Epoch, BitVec>>,
}

impl LivenessTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check_liveness(
        &self,
        epoch: Epoch,
        validator_indices: Vec<ValidatorIndex>,
    ) -> Result<Vec<(ValidatorIndex, bool)>> {
        let live_validators = self.live_validators.read().await;

        validator_indices
            .into_iter()
            .map(|validator_index| {
                let index = usize::try_from(validator_index)?;

                let is_live = live_validators
                    .get(&epoch)
                    .and_then(|validators| validators.get(index))
                    .is_some_and(|bit| *bit);

                Ok((validator_index, is_live))
            })
            .collect()
    }

    pub async fn process_attestation(
        &self,
        current_epoch: Epoch,
        target_epoch: Epoch,
        attesting_indices: impl IntoIterator<Item = ValidatorIndex> + Send,
    ) -> Result<()> {
        if !is_epoch_allowed(current_epoch, target_epoch) {
            return Ok(());
        }

        let mut live_validators = self.live_validators.write().await;

        for validator_index in attesting_indices {
            set(&mut live_validators, target_epoch, validator_index)?;
        }

        Ok(())
    }

    pub async fn process_block(
        &self,
        current_epoch: Epoch,
        slot: Slot,
        proposer_index: ValidatorIndex,
    ) -> Result<()> {
        let epoch = misc::compute_epoch_at_slot(slot);

        if !is_epoch_allowed(current_epoch, epoch) {
            return Ok(());
        }

        set(&mut *self.live_validators.write().await, epoch, proposer_index)
    }

    pub async fn process_sync_committee_message(
        &self,
        current_epoch: Epoch,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Result<()> {
        let epoch = misc::compute_epoch_at_slot(slot);

        if !is_epoch_allowed(current_epoch, epoch) {
            return Ok(());
        }

        set(&mut *self.live_validators.write().await, epoch, validator_index)
    }

    pub async fn prune(&self, current_epoch: Epoch) {
        if let Some(epoch_boundary) = current_epoch.checked_sub(EPOCHS_TO_KEEP_LIVE_VALIDATORS) {
            let mut live_validators = self.live_validators.write().await;
            *live_validators = live_validators.split_off(&epoch_boundary);
        }
    }
}

fn is_epoch_allowed(current_epoch: Epoch, epoch: Epoch) -> bool {
    epoch == current_epoch || epoch == misc::previous_epoch(current_epoch)
}

fn set(
    live_validators: &mut BTreeMap<Epoch, BitVec>,
    epoch: Epoch,
    validator_index: ValidatorIndex,
) -> Result<()> {
    let index = usize::try_from(validator_index)?;
    let bits = live_validators.entry(epoch).or_default();

    bits.resize(bits.len().max(index + 1), false);
    bits.set(index, true);

    Ok(())
}

#[cfg(test)]
mod tests {
    use types::preset::SLOTS_PER_EPOCH;

    use super::*;

    #[tokio::test]
    async fn observed_validators_are_reported_live() {
        let tracker = LivenessTracker::new();

        tracker.process_attestation(5, 5, [3, 9]).await.unwrap();
        tracker
            .process_block(5, SLOTS_PER_EPOCH * 5 + 1, 4)
            .await
            .unwrap();

        let liveness = tracker.check_liveness(5, vec![3, 4, 9, 10]).await.unwrap();

        assert_eq!(
            liveness,
            [(3, true), (4, true), (9, true), (10, false)],
        );
    }

    #[tokio::test]
    async fn epochs_outside_the_tracking_window_are_ignored() {
        let tracker = LivenessTracker::new();

        tracker.process_attestation(5, 3, [1]).await.unwrap();
        tracker.process_attestation(5, 7, [1]).await.unwrap();

        let liveness = tracker.check_liveness(3, vec![1]).await.unwrap();
        assert_eq!(liveness, [(1, false)]);

        let liveness = tracker.check_liveness(7, vec![1]).await.unwrap();
        assert_eq!(liveness, [(1, false)]);
    }

    #[tokio::test]
    async fn sync_committee_messages_count_for_the_previous_epoch() {
        let tracker = LivenessTracker::new();

        let previous_epoch_slot = SLOTS_PER_EPOCH * 4 + 7;
        tracker
            .process_sync_committee_message(5, previous_epoch_slot, 2)
            .await
            .unwrap();

        let liveness = tracker.check_liveness(4, vec![2]).await.unwrap();
        assert_eq!(liveness, [(2, true)]);
    }

    #[tokio::test]
    async fn pruning_discards_old_epochs() {
        let tracker = LivenessTracker::new();

        tracker.process_attestation(5, 5, [1]).await.unwrap();
        tracker.prune(7).await;

        let liveness = tracker.check_liveness(5, vec![1]).await.unwrap();
        assert_eq!(liveness, [(1, true)]);

        tracker.prune(8).await;

        let liveness = tracker.check_liveness(5, vec![1]).await.unwrap();
        assert_eq!(liveness, [(1, false)]);
    }
}
