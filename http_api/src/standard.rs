use std::sync::Arc;

use anyhow::anyhow;
use axum::{extract::State, http::HeaderMap};
use block_producer::{BlockProducer, ProducedBeaconBlock, ProducedBlindedBeaconBlock, ProposerData};
use bls::SignatureBytes;
use chain::Controller;
use duties::{AttesterDuty, DutyResolver, ProposerDuty, SyncCommitteeDuty};
use helper_functions::{accessors, misc};
use liveness_tracker::LivenessTracker;
use log::{debug, info};
use operation_pools::{AttestationAggPool, SyncCommitteeAggPool};
use serde::{Deserialize, Serialize};
use subnet_service::{
    process_beacon_committee_subscriptions, process_sync_committee_subscriptions,
    BeaconCommitteeSubscription, SubnetTracker, SyncCommitteeSubscription,
};
use types::{
    altair::{
        consts::SYNC_COMMITTEE_SUBNET_COUNT,
        containers::{SignedContributionAndProof, SyncCommitteeContribution},
        primitives::SubcommitteeIndex,
    },
    bellatrix::containers::SignedValidatorRegistrationV1,
    nonstandard::WithStatus,
    phase0::{
        containers::{AttestationData, Checkpoint, SignedAggregateAndProof},
        primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex, H256},
    },
};

use crate::{
    error::{Error, IndexedError},
    extractors::{EthJson, EthPath, EthQuery},
    misc::{Broadcaster, SyncedStatus},
    response::{EthResponse, JsonOrSsz},
};

#[derive(Deserialize)]
pub struct AggregateAttestationQuery {
    attestation_data_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    slot: Slot,
}

#[derive(Deserialize)]
pub struct AttestationDataQuery {
    #[serde(with = "serde_utils::quoted_u64")]
    committee_index: CommitteeIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    slot: Slot,
}

#[derive(Deserialize)]
pub struct SyncCommitteeContributionQuery {
    #[serde(with = "serde_utils::quoted_u64")]
    slot: Slot,
    #[serde(with = "serde_utils::quoted_u64")]
    subcommittee_index: SubcommitteeIndex,
    beacon_block_root: H256,
}

#[derive(Deserialize)]
pub struct ValidatorBlockQuery {
    randao_reveal: SignatureBytes,
    graffiti: Option<H256>,
}

#[derive(Serialize)]
pub struct ValidatorLivenessResponse {
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: ValidatorIndex,
    pub is_live: bool,
}

#[derive(Serialize)]
pub struct NodeSyncingResponse {
    #[serde(with = "serde_utils::quoted_u64")]
    pub head_slot: Slot,
    #[serde(with = "serde_utils::quoted_u64")]
    pub sync_distance: u64,
    pub is_syncing: bool,
    pub is_optimistic: bool,
}

/// `GET /eth/v1/node/syncing`
pub async fn node_syncing_status(
    State(controller): State<Arc<dyn Controller>>,
    State(is_synced): State<Arc<SyncedStatus>>,
) -> EthResponse<NodeSyncingResponse> {
    let head = controller.head();
    let current_slot = controller.slot();

    EthResponse::json(NodeSyncingResponse {
        head_slot: head.slot,
        sync_distance: current_slot.saturating_sub(head.slot),
        is_syncing: !is_synced.get(),
        is_optimistic: head.optimistic,
    })
}

/// `POST /eth/v1/validator/duties/attester/{epoch}`
pub async fn validator_attester_duties(
    State(duty_resolver): State<Arc<DutyResolver>>,
    EthPath(epoch): EthPath<Epoch>,
    EthJson(validator_indices): EthJson<Vec<ValidatorIndex>>,
) -> Result<EthResponse<Vec<AttesterDuty>>, Error> {
    let duties = duty_resolver
        .attester_duties(epoch, &validator_indices)
        .await?;

    Ok(EthResponse::json(duties.data)
        .dependent_root(duties.dependent_root)
        .execution_optimistic(duties.execution_optimistic))
}

/// `GET /eth/v1/validator/duties/proposer/{epoch}`
pub async fn validator_proposer_duties(
    State(duty_resolver): State<Arc<DutyResolver>>,
    State(block_producer): State<Arc<BlockProducer>>,
    State(controller): State<Arc<dyn Controller>>,
    EthPath(epoch): EthPath<Epoch>,
) -> Result<EthResponse<Vec<ProposerDuty>>, Error> {
    let duties = duty_resolver.proposer_duties(epoch).await?;

    // Hand the upcoming proposals to the execution engine now so payloads are
    // already being built when the proposers come back for their blocks.
    block_producer
        .prime_payload_ids(
            epoch,
            duties.data.iter().map(|duty| (duty.slot, duty.validator_index)),
            controller.head().block_root,
        )
        .await;

    Ok(EthResponse::json(duties.data)
        .dependent_root(duties.dependent_root)
        .execution_optimistic(duties.execution_optimistic))
}

/// `POST /eth/v1/validator/duties/sync/{epoch}`
pub async fn validator_sync_committee_duties(
    State(duty_resolver): State<Arc<DutyResolver>>,
    EthPath(epoch): EthPath<Epoch>,
    EthJson(validator_indices): EthJson<Vec<ValidatorIndex>>,
) -> Result<EthResponse<Vec<SyncCommitteeDuty>>, Error> {
    let WithStatus {
        value: duties,
        optimistic,
        finalized: _,
    } = duty_resolver
        .sync_committee_duties(epoch, &validator_indices)
        .await?;

    Ok(EthResponse::json(duties).execution_optimistic(optimistic))
}

/// `GET /eth/v1/validator/aggregate_attestation`
pub async fn validator_aggregate_attestation(
    State(attestation_agg_pool): State<Arc<AttestationAggPool>>,
    EthQuery(query): EthQuery<AggregateAttestationQuery>,
) -> Result<EthResponse<types::phase0::containers::Attestation>, Error> {
    let AggregateAttestationQuery {
        attestation_data_root,
        slot,
    } = query;

    let attestation = attestation_agg_pool
        .best_aggregate_attestation_by_data_root(attestation_data_root, slot)
        .await?
        .ok_or(Error::AttestationNotFound)?;

    Ok(EthResponse::json(attestation))
}

/// `GET /eth/v1/validator/attestation_data`
pub async fn validator_attestation_data(
    State(controller): State<Arc<dyn Controller>>,
    EthQuery(query): EthQuery<AttestationDataQuery>,
) -> Result<EthResponse<AttestationData>, Error> {
    let AttestationDataQuery {
        committee_index,
        slot,
    } = query;

    let current_slot = controller.slot();

    if slot > current_slot + 1 {
        return Err(Error::SlotTooFarAhead { slot, current_slot });
    }

    let head = controller.head();

    if head.optimistic {
        return Err(Error::HeadIsOptimistic);
    }

    let state = controller.head_state().await?.value;

    let target = Checkpoint {
        epoch: misc::compute_epoch_at_slot(slot),
        root: accessors::epoch_boundary_block_root(&state, head.block_root),
    };

    Ok(EthResponse::json(AttestationData {
        slot,
        index: committee_index,
        beacon_block_root: head.block_root,
        source: state.current_justified_checkpoint,
        target,
    }))
}

/// `POST /eth/v1/validator/beacon_committee_subscriptions`
pub async fn validator_subscribe_to_beacon_committee(
    State(controller): State<Arc<dyn Controller>>,
    State(subnet_tracker): State<Arc<SubnetTracker>>,
    EthJson(subscriptions): EthJson<Vec<BeaconCommitteeSubscription>>,
) -> Result<(), Error> {
    if subscriptions.is_empty() {
        return Err(Error::NoSubscriptionsProvided);
    }

    let state = controller.head_state().await?.value;

    for subscription in &subscriptions {
        accessors::public_key(&state, subscription.validator_index)
            .map_err(|_| Error::InvalidValidatorIndex)?;
    }

    process_beacon_committee_subscriptions(&subnet_tracker, &subscriptions, |slot| {
        accessors::get_committee_count_per_slot(&state, misc::compute_epoch_at_slot(slot))
    })?;

    Ok(())
}

/// `POST /eth/v1/validator/sync_committee_subscriptions`
pub async fn validator_subscribe_to_sync_committees(
    State(controller): State<Arc<dyn Controller>>,
    State(subnet_tracker): State<Arc<SubnetTracker>>,
    EthJson(subscriptions): EthJson<Vec<SyncCommitteeSubscription>>,
) -> Result<(), Error> {
    if subscriptions.is_empty() {
        return Err(Error::NoSubscriptionsProvided);
    }

    let state = controller.head_state().await?.value;
    let current_epoch = misc::compute_epoch_at_slot(controller.slot());

    let subscriptions = subscriptions
        .into_iter()
        .map(|subscription| {
            let pubkey = accessors::public_key(&state, subscription.validator_index)
                .map_err(|_| Error::InvalidValidatorIndex)?;

            Ok((*pubkey, subscription))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    process_sync_committee_subscriptions(&subnet_tracker, current_epoch, &subscriptions)?;

    Ok(())
}

/// `POST /eth/v1/validator/aggregate_and_proofs`
//
// We box aggregates to reduce the size of temporary collections.
#[allow(clippy::vec_box)]
pub async fn validator_publish_aggregate_and_proofs(
    State(controller): State<Arc<dyn Controller>>,
    State(broadcaster): State<Arc<dyn Broadcaster>>,
    EthJson(aggregates_and_proofs): EthJson<Vec<Box<SignedAggregateAndProof>>>,
) -> Result<(), Error> {
    let current_slot = controller.slot();

    // Validate everything before broadcasting anything.
    for aggregate_and_proof in &aggregates_and_proofs {
        let message = &aggregate_and_proof.message;

        if aggregate_and_proof.signature.is_zero()
            || message.selection_proof.is_zero()
            || message.aggregate.signature.is_zero()
        {
            return Err(Error::ZeroSignature);
        }

        if !misc::attestation_slot_is_timely(message.aggregate.data.slot, current_slot) {
            return Err(Error::AttestationSlotNotValid);
        }
    }

    let mut broadcast_failed = false;

    for aggregate_and_proof in &aggregates_and_proofs {
        match broadcaster
            .publish_aggregate_and_proof(aggregate_and_proof)
            .await
        {
            Ok(()) => {
                let message = &aggregate_and_proof.message;

                debug!(
                    "broadcasting aggregated attestation and proof \
                     (slot: {}, committee_index: {}, aggregator_index: {})",
                    message.aggregate.data.slot,
                    message.aggregate.data.index,
                    message.aggregator_index,
                );
            }
            Err(_) => broadcast_failed = true,
        }
    }

    // Failures do not roll back the aggregates already handed to the network.
    if broadcast_failed {
        return Err(Error::BroadcastFailed);
    }

    Ok(())
}

/// `GET /eth/v1/validator/sync_committee_contribution`
pub async fn validator_sync_committee_contribution(
    State(controller): State<Arc<dyn Controller>>,
    State(sync_committee_agg_pool): State<Arc<SyncCommitteeAggPool>>,
    EthQuery(query): EthQuery<SyncCommitteeContributionQuery>,
) -> Result<EthResponse<SyncCommitteeContribution>, Error> {
    let SyncCommitteeContributionQuery {
        slot,
        subcommittee_index,
        beacon_block_root,
    } = query;

    let state = controller.head_state().await?.value;

    let contribution = sync_committee_agg_pool
        .best_subcommittee_contribution(&state, slot, beacon_block_root, subcommittee_index)
        .await?
        .ok_or(Error::SubcommitteeMessagesNotFound)?;

    Ok(EthResponse::json(contribution))
}

/// `POST /eth/v1/validator/contribution_and_proofs`
///
/// This deviates from [the specification] by reporting per-item failures as
/// `failures` in the error body.
///
/// [the specification]: https://ethereum.github.io/beacon-APIs/
pub async fn validator_publish_contributions_and_proofs(
    State(sync_committee_agg_pool): State<Arc<SyncCommitteeAggPool>>,
    State(broadcaster): State<Arc<dyn Broadcaster>>,
    EthJson(contributions_and_proofs): EthJson<Vec<SignedContributionAndProof>>,
) -> Result<(), Error> {
    let mut failures = vec![];

    for (index, contribution_and_proof) in contributions_and_proofs.iter().enumerate() {
        if let Err(error) = validate_contribution_and_proof(contribution_and_proof) {
            failures.push(IndexedError { index, error });
            continue;
        }

        let message = &contribution_and_proof.message;

        sync_committee_agg_pool
            .record_aggregator_contribution(message.aggregator_index, &message.contribution)
            .await;

        if let Err(error) = broadcaster
            .publish_contribution_and_proof(contribution_and_proof)
            .await
        {
            failures.push(IndexedError { index, error });
        }
    }

    if !failures.is_empty() {
        return Err(Error::InvalidContributionAndProofs(failures));
    }

    Ok(())
}

/// `GET /eth/v2/validator/blocks/{slot}`
pub async fn validator_block(
    State(block_producer): State<Arc<BlockProducer>>,
    EthPath(slot): EthPath<Slot>,
    EthQuery(query): EthQuery<ValidatorBlockQuery>,
    headers: HeaderMap,
) -> Result<EthResponse<ProducedBeaconBlock, JsonOrSsz>, Error> {
    let ValidatorBlockQuery {
        randao_reveal,
        graffiti,
    } = query;

    let block = block_producer
        .produce_beacon_block(slot, randao_reveal, graffiti.unwrap_or_default())
        .await?;

    let version = block.phase();

    Ok(EthResponse::json_or_ssz(block, &headers)?.version(version))
}

/// `GET /eth/v1/validator/blinded_blocks/{slot}`
pub async fn validator_blinded_block(
    State(block_producer): State<Arc<BlockProducer>>,
    EthPath(slot): EthPath<Slot>,
    EthQuery(query): EthQuery<ValidatorBlockQuery>,
    headers: HeaderMap,
) -> Result<EthResponse<ProducedBlindedBeaconBlock, JsonOrSsz>, Error> {
    let ValidatorBlockQuery {
        randao_reveal,
        graffiti,
    } = query;

    let blinded_block = block_producer
        .produce_blinded_beacon_block(slot, randao_reveal, graffiti.unwrap_or_default())
        .await?;

    let version = blinded_block.phase();

    Ok(EthResponse::json_or_ssz(blinded_block, &headers)?.version(version))
}

/// `POST /eth/v1/validator/prepare_beacon_proposer`
pub async fn validator_prepare_beacon_proposer(
    State(block_producer): State<Arc<BlockProducer>>,
    EthJson(proposers): EthJson<Vec<ProposerData>>,
) -> Result<(), Error> {
    let validator_indices = proposers
        .iter()
        .map(|proposer| proposer.validator_index)
        .collect::<Vec<_>>();

    block_producer.add_new_prepared_proposers(proposers).await;

    info!("updated fee recipient addresses for validator indices {validator_indices:?}");

    Ok(())
}

/// `POST /eth/v1/validator/register_validator`
pub async fn validator_register_validator(
    State(block_producer): State<Arc<BlockProducer>>,
    EthJson(registrations): EthJson<Vec<SignedValidatorRegistrationV1>>,
) -> Result<(), Error> {
    if registrations.is_empty() {
        return Err(Error::ValidatorRegistrationEmpty);
    }

    block_producer.register_validators(registrations).await?;

    Ok(())
}

/// `POST /eth/v1/validator/liveness/{epoch}`
pub async fn validator_liveness(
    State(controller): State<Arc<dyn Controller>>,
    State(liveness_tracker): State<Arc<LivenessTracker>>,
    EthPath(epoch): EthPath<Epoch>,
    EthJson(validator_indices): EthJson<Vec<ValidatorIndex>>,
) -> Result<EthResponse<Vec<ValidatorLivenessResponse>>, Error> {
    let current_epoch = misc::compute_epoch_at_slot(controller.slot());

    if epoch > current_epoch {
        return Err(Error::EpochInFuture {
            requested: epoch,
            current: current_epoch,
        });
    }

    let state = controller.head_state().await?.value;

    for validator_index in &validator_indices {
        accessors::public_key(&state, *validator_index)
            .map_err(|_| Error::InvalidValidatorIndex)?;
    }

    let liveness_data = liveness_tracker
        .check_liveness(epoch, validator_indices)
        .await?
        .into_iter()
        .map(|(index, is_live)| ValidatorLivenessResponse { index, is_live })
        .collect();

    Ok(EthResponse::json(liveness_data))
}

fn validate_contribution_and_proof(
    contribution_and_proof: &SignedContributionAndProof,
) -> anyhow::Result<()> {
    let message = &contribution_and_proof.message;
    let contribution = &message.contribution;

    if contribution.subcommittee_index >= SYNC_COMMITTEE_SUBNET_COUNT {
        return Err(anyhow!("The subcommittee index is out of range"));
    }

    if contribution.aggregation_bits.is_zero() {
        return Err(anyhow!("The contribution has no participants"));
    }

    if contribution_and_proof.signature.is_zero()
        || message.selection_proof.is_zero()
        || contribution.signature.is_zero()
    {
        return Err(anyhow!("Signed signatures can't be zero hashes"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result as AnyhowResult};
    use async_trait::async_trait;
    use chain::HeadInfo;
    use ssz_types::{BitList, BitVector};
    use types::{
        altair::containers::ContributionAndProof,
        combined::BeaconState,
        phase0::containers::{AggregateAndProof, Attestation, Validator},
        preset::{MaxValidatorsPerCommittee, SLOTS_PER_EPOCH},
    };

    use super::*;

    const HEAD_ROOT: H256 = H256::repeat_byte(0xbe);

    struct TestController {
        current_slot: Slot,
        validator_count: u64,
    }

    #[async_trait]
    impl Controller for TestController {
        fn slot(&self) -> Slot {
            self.current_slot
        }

        fn genesis_time(&self) -> u64 {
            0
        }

        fn head(&self) -> HeadInfo {
            HeadInfo {
                block_root: HEAD_ROOT,
                slot: self.current_slot,
                optimistic: false,
            }
        }

        async fn head_state(&self) -> AnyhowResult<WithStatus<Arc<BeaconState>>> {
            let validators = (0..self.validator_count)
                .map(|index| {
                    let mut pubkey = [0; 48];
                    pubkey[..8].copy_from_slice(&index.to_le_bytes());

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
                })
                .collect();

            let state = BeaconState {
                slot: self.current_slot,
                validators,
                ..BeaconState::default()
            };

            Ok(WithStatus::valid(Arc::new(state), false))
        }

        async fn state_at_epoch_start(
            &self,
            _epoch: Epoch,
        ) -> AnyhowResult<WithStatus<Arc<BeaconState>>> {
            self.head_state().await
        }

        async fn state_at_slot(
            &self,
            _slot: Slot,
        ) -> AnyhowResult<Option<WithStatus<Arc<BeaconState>>>> {
            Ok(Some(self.head_state().await?))
        }
    }

    #[derive(Default)]
    struct SpyBroadcaster {
        published: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Broadcaster for SpyBroadcaster {
        async fn publish_aggregate_and_proof(
            &self,
            _aggregate_and_proof: &SignedAggregateAndProof,
        ) -> AnyhowResult<()> {
            self.published.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(anyhow!("peer connection lost"));
            }

            Ok(())
        }

        async fn publish_contribution_and_proof(
            &self,
            _contribution_and_proof: &SignedContributionAndProof,
        ) -> AnyhowResult<()> {
            self.published.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(anyhow!("peer connection lost"));
            }

            Ok(())
        }
    }

    fn controller(current_slot: Slot) -> Arc<dyn Controller> {
        Arc::new(TestController {
            current_slot,
            validator_count: 16,
        })
    }

    fn aggregate_and_proof(slot: Slot, outer_signature: SignatureBytes) -> Box<SignedAggregateAndProof> {
        let aggregation_bits = BitList::<MaxValidatorsPerCommittee>::with_capacity(8)
            .expect("8 bits fit in the maximum committee size");

        Box::new(SignedAggregateAndProof {
            message: AggregateAndProof {
                aggregator_index: 0,
                aggregate: Attestation {
                    aggregation_bits,
                    data: AttestationData {
                        slot,
                        index: 0,
                        beacon_block_root: HEAD_ROOT,
                        source: Checkpoint::default(),
                        target: Checkpoint::default(),
                    },
                    signature: SignatureBytes::empty(),
                },
                selection_proof: SignatureBytes::empty(),
            },
            signature: outer_signature,
        })
    }

    fn contribution_and_proof(subcommittee_index: SubcommitteeIndex) -> SignedContributionAndProof {
        let mut aggregation_bits = BitVector::default();
        aggregation_bits.set(1, true).expect("position 1 is in bounds");

        SignedContributionAndProof {
            message: ContributionAndProof {
                aggregator_index: 0,
                contribution: SyncCommitteeContribution {
                    slot: 10,
                    beacon_block_root: HEAD_ROOT,
                    subcommittee_index,
                    aggregation_bits,
                    signature: SignatureBytes::empty(),
                },
                selection_proof: SignatureBytes::empty(),
            },
            signature: SignatureBytes::empty(),
        }
    }

    #[tokio::test]
    async fn missing_aggregates_are_reported_as_not_found() {
        let pool = Arc::new(AttestationAggPool::new());

        let error = validator_aggregate_attestation(
            State(pool),
            EthQuery(AggregateAttestationQuery {
                attestation_data_root: H256::repeat_byte(1),
                slot: 3,
            }),
        )
        .await
        .err()
        .expect("the pool is empty");

        assert_eq!(error.to_string(), "No matching attestation found");
    }

    #[tokio::test]
    async fn zero_signatures_are_rejected_before_broadcasting() {
        let broadcaster = Arc::new(SpyBroadcaster::default());

        let error = validator_publish_aggregate_and_proofs(
            State(controller(10)),
            State(broadcaster.clone() as Arc<dyn Broadcaster>),
            EthJson(vec![aggregate_and_proof(10, SignatureBytes::default())]),
        )
        .await
        .err()
        .expect("an all-zero signature is not a signature");

        assert_eq!(error.to_string(), "Signed signatures can't be zero hashes");
        assert_eq!(broadcaster.published.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_aggregates_are_rejected() {
        let broadcaster = Arc::new(SpyBroadcaster::default());

        let error = validator_publish_aggregate_and_proofs(
            State(controller(100)),
            State(broadcaster as Arc<dyn Broadcaster>),
            EthJson(vec![aggregate_and_proof(10, SignatureBytes::empty())]),
        )
        .await
        .err()
        .expect("slot 10 is more than 32 slots before slot 100");

        assert_eq!(
            error.to_string(),
            "Attestation slot is no longer valid from current time",
        );
    }

    #[tokio::test]
    async fn broadcast_failures_are_summarized_after_all_items_are_attempted() {
        let broadcaster = Arc::new(SpyBroadcaster {
            published: AtomicUsize::new(0),
            fail: true,
        });

        let error = validator_publish_aggregate_and_proofs(
            State(controller(10)),
            State(broadcaster.clone() as Arc<dyn Broadcaster>),
            EthJson(vec![
                aggregate_and_proof(10, SignatureBytes::empty()),
                aggregate_and_proof(9, SignatureBytes::empty()),
            ]),
        )
        .await
        .err()
        .expect("every broadcast failed");

        assert_eq!(
            error.to_string(),
            "Could not broadcast one or more signed aggregated attestations",
        );

        assert_eq!(
            broadcaster.published.load(Ordering::SeqCst),
            2,
            "a failure must not stop the remaining broadcasts",
        );
    }

    #[tokio::test]
    async fn invalid_contributions_fail_itemized_while_valid_ones_go_through() {
        let pool = Arc::new(SyncCommitteeAggPool::new());
        let broadcaster = Arc::new(SpyBroadcaster::default());

        let error = validator_publish_contributions_and_proofs(
            State(pool),
            State(broadcaster.clone() as Arc<dyn Broadcaster>),
            EthJson(vec![
                contribution_and_proof(SYNC_COMMITTEE_SUBNET_COUNT),
                contribution_and_proof(0),
            ]),
        )
        .await
        .err()
        .expect("the first contribution is invalid");

        let Error::InvalidContributionAndProofs(failures) = error else {
            panic!("the failures must be itemized");
        };

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 0);
        assert_eq!(broadcaster.published.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn liveness_rejects_future_epochs_and_unknown_indices() {
        let tracker = Arc::new(LivenessTracker::new());

        let error = validator_liveness(
            State(controller(SLOTS_PER_EPOCH * 2)),
            State(tracker.clone()),
            EthPath(5),
            EthJson(vec![0]),
        )
        .await
        .err()
        .expect("epoch 5 has not started yet");

        assert!(error.to_string().contains("cannot be in the future"));

        let error = validator_liveness(
            State(controller(SLOTS_PER_EPOCH * 2)),
            State(tracker),
            EthPath(2),
            EthJson(vec![500]),
        )
        .await
        .err()
        .expect("validator 500 does not exist");

        assert_eq!(error.to_string(), "Invalid validator index");
    }

    #[tokio::test]
    async fn liveness_reports_observed_validators() {
        let tracker = Arc::new(LivenessTracker::new());
        tracker.process_attestation(2, 2, [3]).await.unwrap();

        let response = validator_liveness(
            State(controller(SLOTS_PER_EPOCH * 2)),
            State(tracker),
            EthPath(2),
            EthJson(vec![3, 4]),
        )
        .await
        .expect("the request is valid");

        let json = serde_json::to_value(response).expect("the response serializes");

        assert_eq!(
            json,
            serde_json::json!({
                "data": [
                    { "index": "3", "is_live": true },
                    { "index": "4", "is_live": false },
                ],
            }),
        );
    }

    #[tokio::test]
    async fn empty_subscription_batches_are_rejected() {
        let error = validator_subscribe_to_beacon_committee(
            State(controller(10)),
            State(Arc::new(SubnetTracker::new())),
            EthJson(vec![]),
        )
        .await
        .err()
        .expect("an empty batch is malformed");

        assert_eq!(error.to_string(), "No subscriptions provided");
    }
}
