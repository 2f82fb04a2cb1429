use std::collections::{BTreeMap, BTreeSet, HashMap};

use bls::PublicKeyBytes;
use log::debug;
use parking_lot::Mutex;
use types::{
    phase0::primitives::{Epoch, Slot, SubnetId},
    preset::SLOTS_PER_EPOCH,
};

use helper_functions::misc;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PersistentSubnets {
    pub subnets: BTreeSet<SubnetId>,
    pub until_epoch: Epoch,
}

/// Tracks which gossip subnets this node has expressed interest in.
///
/// This is a hint for the P2P layer, not chain state. Reads never fail;
/// absence is reported with a `bool`. Each map is guarded by its own mutex
/// and nothing blocking happens while one is held.
#[derive(Default)]
pub struct SubnetTracker {
    attester_subnets: Mutex<BTreeMap<Slot, BTreeSet<SubnetId>>>,
    aggregator_subnets: Mutex<BTreeMap<Slot, BTreeSet<SubnetId>>>,
    persistent_subnets: Mutex<HashMap<PublicKeyBytes, PersistentSubnets>>,
}

impl SubnetTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attester_subnet(&self, slot: Slot, subnet_id: SubnetId) {
        self.attester_subnets
            .lock()
            .entry(slot)
            .or_default()
            .insert(subnet_id);
    }

    pub fn add_aggregator_subnet(&self, slot: Slot, subnet_id: SubnetId) {
        self.aggregator_subnets
            .lock()
            .entry(slot)
            .or_default()
            .insert(subnet_id);
    }

    pub fn add_persistent_subnets(
        &self,
        pubkey: PublicKeyBytes,
        subnets: BTreeSet<SubnetId>,
        until_epoch: Epoch,
    ) {
        let mut persistent_subnets = self.persistent_subnets.lock();

        let entry = persistent_subnets
            .entry(pubkey)
            .or_insert_with(|| PersistentSubnets {
                subnets: BTreeSet::new(),
                until_epoch,
            });

        entry.subnets.extend(subnets);
        entry.until_epoch = entry.until_epoch.max(until_epoch);
    }

    #[must_use]
    pub fn attester_subnets(&self, slot: Slot) -> (BTreeSet<SubnetId>, bool) {
        match self.attester_subnets.lock().get(&slot) {
            Some(subnets) => (subnets.clone(), true),
            None => (BTreeSet::new(), false),
        }
    }

    #[must_use]
    pub fn aggregator_subnets(&self, slot: Slot) -> (BTreeSet<SubnetId>, bool) {
        match self.aggregator_subnets.lock().get(&slot) {
            Some(subnets) => (subnets.clone(), true),
            None => (BTreeSet::new(), false),
        }
    }

    #[must_use]
    pub fn persistent_subnets(&self, pubkey: &PublicKeyBytes) -> Option<PersistentSubnets> {
        self.persistent_subnets.lock().get(pubkey).cloned()
    }

    /// All subnets any tracked validator is persistently subscribed to.
    #[must_use]
    pub fn all_persistent_subnets(&self) -> BTreeSet<SubnetId> {
        self.persistent_subnets
            .lock()
            .values()
            .flat_map(|entry| entry.subnets.iter().copied())
            .collect()
    }

    /// Discards slot-keyed entries older than the previous epoch and expired
    /// persistent subscriptions. Entries written for `slot` or later are
    /// never touched, even if the prune raced the write.
    pub fn on_slot(&self, slot: Slot) {
        let current_epoch = misc::compute_epoch_at_slot(slot);
        let cutoff = misc::compute_start_slot_at_epoch(misc::previous_epoch(current_epoch));

        for subnets in [&self.attester_subnets, &self.aggregator_subnets] {
            let mut subnets = subnets.lock();
            *subnets = subnets.split_off(&cutoff);
        }

        let mut persistent_subnets = self.persistent_subnets.lock();
        let before = persistent_subnets.len();

        persistent_subnets.retain(|_, entry| entry.until_epoch > current_epoch);

        let expired = before - persistent_subnets.len();

        if expired > 0 {
            debug!("discarded {expired} expired persistent subnet subscriptions");
        }
    }

    pub fn clear(&self) {
        self.attester_subnets.lock().clear();
        self.aggregator_subnets.lock().clear();
        self.persistent_subnets.lock().clear();
    }
}
