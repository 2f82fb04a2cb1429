use std::collections::BTreeMap;

use helper_functions::misc;
use parking_lot::Mutex;
use types::phase0::primitives::{Epoch, ExecutionAddress, Slot, ValidatorIndex, H256};

pub type PayloadId = alloy_primitives::B64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PayloadIdEntry {
    pub proposer_index: ValidatorIndex,
    pub payload_id: PayloadId,
    pub fee_recipient: ExecutionAddress,
}

/// Remembers which payload the execution engine is building for an upcoming
/// proposal, keyed by `(slot, parent block root)`.
///
/// Entries are written when proposer duties are computed and read back at
/// proposal time. Pruning retains the current and next epoch only.
#[derive(Default)]
pub struct PayloadIdCache {
    entries: Mutex<BTreeMap<(Slot, H256), PayloadIdEntry>>,
}

impl PayloadIdCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &self,
        slot: Slot,
        parent_root: H256,
        proposer_index: ValidatorIndex,
        payload_id: PayloadId,
        fee_recipient: ExecutionAddress,
    ) {
        self.entries.lock().insert(
            (slot, parent_root),
            PayloadIdEntry {
                proposer_index,
                payload_id,
                fee_recipient,
            },
        );
    }

    #[must_use]
    pub fn get(&self, slot: Slot, parent_root: H256) -> Option<PayloadIdEntry> {
        self.entries.lock().get(&(slot, parent_root)).copied()
    }

    /// Removes entries for slots before the start of `epoch`. An entry
    /// written at or after the cutoff survives, even if it was inserted
    /// while the prune was underway; insertion and pruning serialize on the
    /// same lock.
    pub fn prune_before(&self, epoch: Epoch) {
        let cutoff = (misc::compute_start_slot_at_epoch(epoch), H256::ZERO);

        let mut entries = self.entries.lock();
        *entries = entries.split_off(&cutoff);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use types::preset::SLOTS_PER_EPOCH;

    use super::*;

    const PARENT_ROOT: H256 = H256::repeat_byte(1);

    fn entry(proposer_index: ValidatorIndex) -> (ValidatorIndex, PayloadId, ExecutionAddress) {
        (
            proposer_index,
            PayloadId::repeat_byte(7),
            ExecutionAddress::repeat_byte(9),
        )
    }

    #[test]
    fn get_returns_what_set_stored() {
        let cache = PayloadIdCache::new();
        let (proposer_index, payload_id, fee_recipient) = entry(5);

        cache.set(10, PARENT_ROOT, proposer_index, payload_id, fee_recipient);

        assert_eq!(
            cache.get(10, PARENT_ROOT),
            Some(PayloadIdEntry {
                proposer_index,
                payload_id,
                fee_recipient,
            }),
        );

        assert_eq!(cache.get(10, H256::ZERO), None, "parent root is part of the key");
        assert_eq!(cache.get(11, PARENT_ROOT), None);
    }

    #[test]
    fn pruning_retains_the_cutoff_epoch_and_later() {
        let cache = PayloadIdCache::new();
        let (proposer_index, payload_id, fee_recipient) = entry(5);

        cache.set(0, PARENT_ROOT, proposer_index, payload_id, fee_recipient);
        cache.set(
            SLOTS_PER_EPOCH - 1,
            PARENT_ROOT,
            proposer_index,
            payload_id,
            fee_recipient,
        );
        cache.set(SLOTS_PER_EPOCH, PARENT_ROOT, proposer_index, payload_id, fee_recipient);
        cache.set(
            SLOTS_PER_EPOCH * 2,
            PARENT_ROOT,
            proposer_index,
            payload_id,
            fee_recipient,
        );

        cache.prune_before(1);

        assert_eq!(cache.get(0, PARENT_ROOT), None);
        assert_eq!(cache.get(SLOTS_PER_EPOCH - 1, PARENT_ROOT), None);
        assert!(cache.get(SLOTS_PER_EPOCH, PARENT_ROOT).is_some());
        assert!(cache.get(SLOTS_PER_EPOCH * 2, PARENT_ROOT).is_some());
    }

    #[test]
    fn entries_written_after_the_cutoff_survive_concurrent_pruning() {
        let cache = Arc::new(PayloadIdCache::new());
        let (proposer_index, payload_id, fee_recipient) = entry(5);

        let writer = {
            let cache = Arc::clone(&cache);

            thread::spawn(move || {
                for offset in 0..100 {
                    cache.set(
                        SLOTS_PER_EPOCH + offset % SLOTS_PER_EPOCH,
                        PARENT_ROOT,
                        proposer_index,
                        payload_id,
                        fee_recipient,
                    );
                }
            })
        };

        for _ in 0..100 {
            cache.prune_before(1);
        }

        writer.join().expect("writer thread does not panic");
        cache.prune_before(1);

        assert!(
            cache.get(SLOTS_PER_EPOCH, PARENT_ROOT).is_some(),
            "the entry is at the cutoff and must not be pruned",
        );
    }
}
