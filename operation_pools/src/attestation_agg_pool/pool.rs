use std::{collections::BTreeMap, sync::Arc};

use anyhow::{anyhow, Result};
use bls::AggregateSignature;
use helper_functions::misc;
use tokio::sync::RwLock;
use tree_hash::TreeHash as _;
use types::phase0::{
    containers::{Attestation, AttestationData},
    primitives::{Epoch, Slot, H256},
};

use crate::attestation_agg_pool::types::{
    Aggregate, AggregateEntry, AggregateMap, SingularAttestationEntry, SingularAttestationMap,
};

/// Attestations waiting to be served to aggregating validators, grouped by
/// target epoch and attestation data root.
///
/// Selection methods operate on a snapshot cloned under the read lock, so a
/// concurrent insertion cannot change the result of a call in progress.
#[derive(Default)]
pub struct Pool {
    aggregates: RwLock<BTreeMap<Epoch, AggregateMap>>,
    singular_attestations: RwLock<BTreeMap<Epoch, SingularAttestationMap>>,
}

impl Pool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards attestations older than the previous epoch. Runs at epoch
    /// starts; entries for the previous and current epoch survive.
    pub async fn on_slot(&self, slot: Slot) {
        if !misc::is_epoch_start(slot) {
            return;
        }

        let current_epoch = misc::compute_epoch_at_slot(slot);
        let previous_epoch = misc::previous_epoch(current_epoch);

        let mut aggregates = self.aggregates.write().await;
        *aggregates = aggregates.split_off(&previous_epoch);
        drop(aggregates);

        let mut singular_attestations = self.singular_attestations.write().await;
        *singular_attestations = singular_attestations.split_off(&previous_epoch);
    }

    pub async fn add_aggregate(&self, attestation: Attestation) -> Result<()> {
        let Attestation {
            aggregation_bits,
            data,
            signature,
        } = attestation;

        let aggregate = Aggregate {
            aggregation_bits,
            signature: AggregateSignature::try_from(signature)
                .map_err(|error| anyhow!(error))?,
        };

        self.aggregates
            .write()
            .await
            .entry(data.target.epoch)
            .or_default()
            .entry(data.tree_hash_root())
            .or_insert_with(|| AggregateEntry {
                data,
                aggregates: vec![],
            })
            .aggregates
            .push(aggregate);

        Ok(())
    }

    pub async fn add_singular_attestation(&self, attestation: Arc<Attestation>) {
        let data = attestation.data;

        self.singular_attestations
            .write()
            .await
            .entry(data.target.epoch)
            .or_default()
            .entry(data.tree_hash_root())
            .or_insert_with(|| SingularAttestationEntry {
                data,
                attestations: vec![],
            })
            .attestations
            .push(attestation);
    }

    /// The best aggregate for `(attestation_data_root, slot)`.
    ///
    /// Aggregates already in the pool are preferred. If none match, one is
    /// computed on the fly from the singular attestations with the same data.
    /// Either way the result is deterministic for a given pool state.
    pub async fn best_aggregate_attestation_by_data_root(
        &self,
        attestation_data_root: H256,
        slot: Slot,
    ) -> Result<Option<Attestation>> {
        let epoch = misc::compute_epoch_at_slot(slot);

        let entry = self
            .aggregates
            .read()
            .await
            .get(&epoch)
            .and_then(|epoch_aggregates| epoch_aggregates.get(&attestation_data_root))
            .filter(|entry| entry.data.slot == slot)
            .cloned();

        if let Some(entry) = entry {
            if let Some(aggregate) = select_best(&entry.aggregates) {
                return Ok(Some(Attestation {
                    aggregation_bits: aggregate.aggregation_bits.clone(),
                    data: entry.data,
                    signature: aggregate.signature.into(),
                }));
            }
        }

        self.aggregate_singular_attestations(attestation_data_root, slot, epoch)
            .await
    }

    async fn aggregate_singular_attestations(
        &self,
        attestation_data_root: H256,
        slot: Slot,
        epoch: Epoch,
    ) -> Result<Option<Attestation>> {
        let entry = self
            .singular_attestations
            .read()
            .await
            .get(&epoch)
            .and_then(|epoch_attestations| epoch_attestations.get(&attestation_data_root))
            .filter(|entry| entry.data.slot == slot)
            .cloned();

        let Some(SingularAttestationEntry { data, attestations }) = entry else {
            return Ok(None);
        };

        let Some((first, rest)) = attestations.split_first() else {
            return Ok(None);
        };

        let mut aggregation_bits = first.aggregation_bits.clone();
        let mut signature = AggregateSignature::try_from(first.signature)
            .map_err(|error| anyhow!(error))?;

        for attestation in rest {
            let bits = &attestation.aggregation_bits;

            let overlaps = (0..bits.len()).try_fold(false, |overlaps, index| {
                Ok::<_, anyhow::Error>(
                    overlaps
                        || bits.get(index).map_err(|error| anyhow!("{error:?}"))?
                            && aggregation_bits
                                .get(index)
                                .map_err(|error| anyhow!("{error:?}"))?,
                )
            })?;

            if overlaps {
                continue;
            }

            for index in 0..bits.len() {
                if bits.get(index).map_err(|error| anyhow!("{error:?}"))? {
                    aggregation_bits
                        .set(index, true)
                        .map_err(|error| anyhow!("{error:?}"))?;
                }
            }

            signature.aggregate_in_place(
                AggregateSignature::try_from(attestation.signature)
                    .map_err(|error| anyhow!(error))?,
            );
        }

        Ok(Some(Attestation {
            aggregation_bits,
            data,
            signature: signature.into(),
        }))
    }
}

/// The aggregate with the most participants. Set bits decide, not bitlist
/// length; on a tie the earliest candidate wins.
fn select_best(candidates: &[Aggregate]) -> Option<&Aggregate> {
    candidates.iter().fold(None, |best, candidate| match best {
        Some(best) if candidate.aggregation_bits.num_set_bits() <= best.aggregation_bits.num_set_bits() => {
            Some(best)
        }
        _ => Some(candidate),
    })
}
