use std::collections::{BTreeMap, HashSet};

use anyhow::{anyhow, Result};
use bls::AggregateSignature;
use helper_functions::accessors;
use log::debug;
use ssz_types::BitVector;
use tokio::sync::RwLock;
use types::{
    altair::{
        containers::{SyncCommitteeContribution, SyncCommitteeMessage},
        primitives::SubcommitteeIndex,
    },
    combined::BeaconState,
    phase0::primitives::{Slot, ValidatorIndex, H256},
    preset::SyncSubcommitteeSize,
};

use crate::sync_committee_agg_pool::types::ContributionData;

/// Sync committee messages waiting to be combined into contributions.
///
/// Messages are kept in insertion order so that repeated aggregation over an
/// unchanged pool is byte-identical.
#[derive(Default)]
pub struct Pool {
    sync_committee_messages: RwLock<BTreeMap<ContributionData, Vec<SyncCommitteeMessage>>>,
    aggregator_contributions: RwLock<HashSet<(ValidatorIndex, Slot, SubcommitteeIndex)>>,
}

impl Pool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything older than the previous slot. Messages and
    /// contribution markers are discarded together; discarding them
    /// separately has led to a bug.
    pub async fn on_slot(&self, slot: Slot) {
        let Some(previous_slot) = slot.checked_sub(1) else {
            return;
        };

        let mut messages = self.sync_committee_messages.write().await;
        *messages = messages.split_off(&ContributionData::first_in_slot(previous_slot));
        drop(messages);

        self.aggregator_contributions
            .write()
            .await
            .retain(|(_, slot, _)| *slot >= previous_slot);
    }

    pub async fn add_sync_committee_message(
        &self,
        subcommittee_index: SubcommitteeIndex,
        message: SyncCommitteeMessage,
    ) {
        let data = ContributionData {
            slot: message.slot,
            beacon_block_root: message.beacon_block_root,
            subcommittee_index,
        };

        let mut messages = self.sync_committee_messages.write().await;
        let pool_messages = messages.entry(data).or_default();

        if pool_messages.contains(&message) {
            debug!("duplicate sync committee message ignored (message: {message:?})");
            return;
        }

        pool_messages.push(message);
    }

    pub async fn record_aggregator_contribution(
        &self,
        aggregator_index: ValidatorIndex,
        contribution: &SyncCommitteeContribution,
    ) {
        self.aggregator_contributions.write().await.insert((
            aggregator_index,
            contribution.slot,
            contribution.subcommittee_index,
        ));
    }

    pub async fn aggregator_contribution_exists(
        &self,
        aggregator_index: ValidatorIndex,
        contribution: &SyncCommitteeContribution,
    ) -> bool {
        self.aggregator_contributions.read().await.contains(&(
            aggregator_index,
            contribution.slot,
            contribution.subcommittee_index,
        ))
    }

    /// Combines all messages for `(slot, beacon_block_root,
    /// subcommittee_index)` into one contribution: each message ORs in the
    /// position bits of its validator's key within the subcommittee and its
    /// signature joins the aggregate, in message insertion order.
    ///
    /// Returns `None` if no messages are pooled for the key.
    pub async fn best_subcommittee_contribution(
        &self,
        state: &BeaconState,
        slot: Slot,
        beacon_block_root: H256,
        subcommittee_index: SubcommitteeIndex,
    ) -> Result<Option<SyncCommitteeContribution>> {
        let data = ContributionData {
            slot,
            beacon_block_root,
            subcommittee_index,
        };

        // Snapshot under the read lock; later insertions do not affect this
        // call.
        let messages = self
            .sync_committee_messages
            .read()
            .await
            .get(&data)
            .cloned();

        let Some(messages) = messages.filter(|messages| !messages.is_empty()) else {
            return Ok(None);
        };

        let subcommittee_pubkeys =
            accessors::get_sync_subcommittee_pubkeys(state, subcommittee_index)?;

        let mut aggregation_bits = BitVector::<SyncSubcommitteeSize>::default();
        let mut signature = AggregateSignature::default();

        for message in &messages {
            let validator_pubkey = accessors::public_key(state, message.validator_index)?;

            for (position, pubkey) in subcommittee_pubkeys.iter().enumerate() {
                if pubkey != validator_pubkey {
                    continue;
                }

                if aggregation_bits
                    .get(position)
                    .map_err(|error| anyhow!("{error:?}"))?
                {
                    continue;
                }

                aggregation_bits
                    .set(position, true)
                    .map_err(|error| anyhow!("{error:?}"))?;

                signature.aggregate_in_place(
                    AggregateSignature::try_from(message.signature)
                        .map_err(|error| anyhow!(error))?,
                );
            }
        }

        Ok(Some(SyncCommitteeContribution {
            slot,
            beacon_block_root,
            subcommittee_index,
            aggregation_bits,
            signature: signature.into(),
        }))
    }
}
