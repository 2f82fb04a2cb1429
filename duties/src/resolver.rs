use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use anyhow::Error as AnyhowError;
use chain::Controller;
use helper_functions::{accessors, misc};
use shuffling::Shuffling;
use types::{
    combined::BeaconState,
    nonstandard::{SyncCommitteeEpoch, WithStatus},
    phase0::{
        consts::GENESIS_EPOCH,
        primitives::{Epoch, Slot, ValidatorIndex, H256},
    },
};

use crate::{
    containers::{AttesterDuty, ProposerDuty, ResolvedDuties, SyncCommitteeDuty},
    error::Error,
    sync_committee_periods::SyncCommitteeEpochRelation,
};

/// Computes per-epoch duty assignments from chain-state snapshots.
///
/// All methods are deterministic for a given snapshot: repeated calls against
/// unchanged state return identical results.
pub struct DutyResolver {
    controller: Arc<dyn Controller>,
    shuffling: Arc<dyn Shuffling>,
}

impl DutyResolver {
    #[must_use]
    pub fn new(controller: Arc<dyn Controller>, shuffling: Arc<dyn Shuffling>) -> Self {
        Self {
            controller,
            shuffling,
        }
    }

    pub async fn attester_duties(
        &self,
        epoch: Epoch,
        validator_indices: &[ValidatorIndex],
    ) -> Result<ResolvedDuties<AttesterDuty>, Error> {
        let current_epoch = self.validate_duty_epoch(epoch)?;

        let WithStatus {
            value: state,
            optimistic,
            finalized: _,
        } = self
            .controller
            .state_at_epoch_start(epoch.min(current_epoch))
            .await?;

        // Reject unknown indices before touching committees. An index that is
        // merely inactive this epoch is valid and simply yields no duty.
        for validator_index in validator_indices {
            accessors::public_key(&state, *validator_index)
                .map_err(|_| Error::InvalidValidatorIndex)?;
        }

        let shuffling = self.shuffling.epoch_shuffling(&state, epoch)?;
        let committees_at_slot =
            misc::committee_count_from_active_validator_count(shuffling.len() as u64);

        let requested = validator_indices
            .iter()
            .copied()
            .collect::<HashSet<ValidatorIndex>>();

        let mut duties = vec![];

        for slot in misc::slots_in_epoch(epoch) {
            let committees = accessors::beacon_committees(&shuffling, slot, committees_at_slot);

            for (committee, committee_index) in committees.zip(0..) {
                for (position, validator_index) in committee.iter().copied().enumerate() {
                    if !requested.contains(&validator_index) {
                        continue;
                    }

                    let pubkey = *accessors::public_key(&state, validator_index)
                        .map_err(|_| Error::InvalidValidatorIndex)?;

                    duties.push(AttesterDuty {
                        pubkey,
                        validator_index,
                        committee_index,
                        committee_length: committee.len() as u64,
                        committees_at_slot,
                        validator_committee_index: position as u64,
                        slot,
                    });
                }
            }
        }

        let dependent_root = self.attestation_dependent_root(&state, epoch)?;

        Ok(ResolvedDuties {
            data: duties,
            dependent_root,
            execution_optimistic: optimistic,
        })
    }

    pub async fn proposer_duties(
        &self,
        epoch: Epoch,
    ) -> Result<ResolvedDuties<ProposerDuty>, Error> {
        let current_epoch = self.validate_duty_epoch(epoch)?;

        // Requests for the next epoch are answered from the current epoch's
        // snapshot through a separate lookahead path. The ordering it
        // produces differs from what the next epoch's own state would give;
        // both sides of the API rely on it staying this way.
        let (state, optimistic, duties) = if epoch > current_epoch {
            let WithStatus {
                value: state,
                optimistic,
                finalized: _,
            } = self.controller.state_at_epoch_start(current_epoch).await?;

            let duties = self.proposer_duties_lookahead(&state, epoch)?;
            (state, optimistic, duties)
        } else {
            let WithStatus {
                value: state,
                optimistic,
                finalized: _,
            } = self.controller.state_at_epoch_start(epoch).await?;

            let duties = self.proposer_duties_at_epoch(&state, epoch)?;
            (state, optimistic, duties)
        };

        let dependent_root = self.proposal_dependent_root(&state, epoch)?;

        Ok(ResolvedDuties {
            data: duties,
            dependent_root,
            execution_optimistic: optimistic,
        })
    }

    pub async fn sync_committee_duties(
        &self,
        epoch: Epoch,
        validator_indices: &[ValidatorIndex],
    ) -> Result<WithStatus<Vec<SyncCommitteeDuty>>, Error> {
        let current_epoch = misc::compute_epoch_at_slot(self.controller.slot());

        let committee_epoch =
            match SyncCommitteeEpochRelation::classify(epoch, current_epoch) {
                SyncCommitteeEpochRelation::CurrentPeriod => SyncCommitteeEpoch::Current,
                SyncCommitteeEpochRelation::NextPeriod => SyncCommitteeEpoch::Next,
                SyncCommitteeEpochRelation::Invalid => {
                    return Err(Error::EpochTooFarInFuture {
                        last_valid: misc::sync_committee_duties_last_valid_epoch(current_epoch),
                    })
                }
            };

        let WithStatus {
            value: state,
            optimistic,
            finalized,
        } = self
            .controller
            .state_at_epoch_start(epoch.min(current_epoch))
            .await?;

        let Some(committee) = state.sync_committee(committee_epoch) else {
            // The first sync committee is not known until the Altair fork.
            return Ok(WithStatus {
                value: vec![],
                optimistic,
                finalized,
            });
        };

        let mut positions = HashMap::<_, Vec<u64>>::new();

        for (position, pubkey) in committee.pubkeys.iter().enumerate() {
            positions.entry(pubkey).or_default().push(position as u64);
        }

        let mut duties = vec![];

        for validator_index in validator_indices.iter().copied() {
            let pubkey = accessors::public_key(&state, validator_index)
                .map_err(|_| Error::InvalidValidatorIndex)?;

            if let Some(validator_sync_committee_indices) = positions.get(pubkey) {
                duties.push(SyncCommitteeDuty {
                    pubkey: *pubkey,
                    validator_index,
                    validator_sync_committee_indices: validator_sync_committee_indices.clone(),
                });
            }
        }

        Ok(WithStatus {
            value: duties,
            optimistic,
            finalized,
        })
    }

    /// Proposers for an epoch the state has already reached.
    fn proposer_duties_at_epoch(
        &self,
        state: &BeaconState,
        epoch: Epoch,
    ) -> Result<Vec<ProposerDuty>, Error> {
        self.collect_proposer_duties(state, epoch)
    }

    /// Proposers for the epoch after the state's own, computed from the
    /// current epoch's snapshot. Kept separate from
    /// [`Self::proposer_duties_at_epoch`]; see [`Self::proposer_duties`].
    fn proposer_duties_lookahead(
        &self,
        state: &BeaconState,
        epoch: Epoch,
    ) -> Result<Vec<ProposerDuty>, Error> {
        self.collect_proposer_duties(state, epoch)
    }

    fn collect_proposer_duties(
        &self,
        state: &BeaconState,
        epoch: Epoch,
    ) -> Result<Vec<ProposerDuty>, Error> {
        misc::slots_in_epoch(epoch)
            .map(|slot| {
                let validator_index = self.shuffling.proposer_index(state, slot)?;

                let pubkey = *accessors::public_key(state, validator_index)
                    .map_err(AnyhowError::new)?;

                Ok(ProposerDuty {
                    pubkey,
                    validator_index,
                    slot,
                })
            })
            .collect()
    }

    fn validate_duty_epoch(&self, epoch: Epoch) -> Result<Epoch, Error> {
        let current_epoch = misc::compute_epoch_at_slot(self.controller.slot());
        let next_epoch = current_epoch + 1;

        if epoch > next_epoch {
            return Err(Error::EpochAfterNext {
                requested: epoch,
                next: next_epoch,
            });
        }

        Ok(current_epoch)
    }

    /// `get_block_root_at_slot(state, epoch_start(epoch - 1) - 1)`, or the
    /// head root when the slot is not covered by the state (genesis).
    fn attestation_dependent_root(
        &self,
        state: &BeaconState,
        epoch: Epoch,
    ) -> Result<H256, Error> {
        let dependent_root_slot = if epoch <= GENESIS_EPOCH + 1 {
            0
        } else {
            misc::compute_start_slot_at_epoch(epoch - 1) - 1
        };

        self.block_root_or_head(state, dependent_root_slot)
    }

    /// `get_block_root_at_slot(state, epoch_start(epoch) - 1)`, falling back
    /// to the head root when the dependent slot is not earlier than the
    /// state's slot.
    fn proposal_dependent_root(&self, state: &BeaconState, epoch: Epoch) -> Result<H256, Error> {
        let dependent_root_slot = if epoch == GENESIS_EPOCH {
            0
        } else {
            misc::compute_start_slot_at_epoch(epoch) - 1
        };

        self.block_root_or_head(state, dependent_root_slot)
    }

    fn block_root_or_head(&self, state: &BeaconState, slot: Slot) -> Result<H256, Error> {
        if slot >= state.slot {
            return Ok(self.controller.head().block_root);
        }

        accessors::get_block_root_at_slot(state, slot)
            .map_err(AnyhowError::new)
            .map_err(Error::Internal)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result as AnyhowResult;
    use async_trait::async_trait;
    use chain::HeadInfo;
    use helper_functions::accessors as test_accessors;
    use types::{
        altair::containers::SyncCommittee,
        phase0::containers::{Checkpoint, Validator},
        preset::SLOTS_PER_EPOCH,
    };

    use super::*;

    const HEAD_ROOT: H256 = H256::repeat_byte(0xbe);

    struct TestController {
        current_slot: Slot,
        states: HashMap<Epoch, Arc<BeaconState>>,
        optimistic: bool,
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
                optimistic: self.optimistic,
            }
        }

        async fn head_state(&self) -> AnyhowResult<WithStatus<Arc<BeaconState>>> {
            let epoch = misc::compute_epoch_at_slot(self.current_slot);
            self.state_at_epoch_start(epoch).await
        }

        async fn state_at_epoch_start(
            &self,
            epoch: Epoch,
        ) -> AnyhowResult<WithStatus<Arc<BeaconState>>> {
            let state = self
                .states
                .get(&epoch)
                .ok_or_else(|| anyhow::anyhow!("no state for epoch {epoch}"))?
                .clone();

            Ok(WithStatus {
                value: state,
                optimistic: self.optimistic,
                finalized: false,
            })
        }

        async fn state_at_slot(
            &self,
            slot: Slot,
        ) -> AnyhowResult<Option<WithStatus<Arc<BeaconState>>>> {
            let epoch = misc::compute_epoch_at_slot(slot);
            Ok(self.state_at_epoch_start(epoch).await.ok())
        }
    }

    /// Rotates the active validator list by the epoch number. Deterministic
    /// and epoch-sensitive, which is all duty computation relies on.
    struct RotatingShuffling;

    impl Shuffling for RotatingShuffling {
        fn epoch_shuffling(
            &self,
            state: &BeaconState,
            epoch: Epoch,
        ) -> AnyhowResult<Vec<ValidatorIndex>> {
            let mut indices =
                test_accessors::active_validator_indices(state, epoch).collect::<Vec<_>>();

            let length = indices.len();
            indices.rotate_left(epoch as usize % length.max(1));
            Ok(indices)
        }

        fn proposer_index(&self, state: &BeaconState, slot: Slot) -> AnyhowResult<ValidatorIndex> {
            let epoch = misc::compute_epoch_at_slot(slot);
            let shuffling = self.epoch_shuffling(state, epoch)?;
            Ok(shuffling[(slot as usize * 7) % shuffling.len()])
        }
    }

    fn validator(index: u64) -> Validator {
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
    }

    fn state_at_slot(slot: Slot, validator_count: u64) -> BeaconState {
        BeaconState {
            slot,
            validators: (0..validator_count).map(validator).collect(),
            block_roots: (0..64)
                .map(|index| H256::repeat_byte(index as u8))
                .collect(),
            randao_mixes: vec![H256::ZERO; 64],
            current_justified_checkpoint: Checkpoint::default(),
            current_sync_committee: None,
            next_sync_committee: None,
        }
    }

    fn resolver_at_epoch_one(validator_count: u64) -> DutyResolver {
        let current_slot = SLOTS_PER_EPOCH + 5;

        let states = HashMap::from([
            (0, Arc::new(state_at_slot(0, validator_count))),
            (
                1,
                Arc::new(state_at_slot(SLOTS_PER_EPOCH, validator_count)),
            ),
        ]);

        let controller = TestController {
            current_slot,
            states,
            optimistic: false,
        };

        DutyResolver::new(Arc::new(controller), Arc::new(RotatingShuffling))
    }

    #[tokio::test]
    async fn attester_duties_are_internally_consistent() {
        let resolver = resolver_at_epoch_one(128);

        let duties = resolver
            .attester_duties(1, &(0..128).collect::<Vec<_>>())
            .await
            .expect("every validator is active");

        assert_eq!(duties.data.len(), 128, "one duty per active validator");

        for duty in &duties.data {
            assert!(duty.validator_committee_index < duty.committee_length);
            assert_eq!(duty.committees_at_slot, 1);
            assert!(misc::compute_epoch_at_slot(duty.slot) == 1);
        }
    }

    #[tokio::test]
    async fn attester_duties_match_the_shuffling_fixture() {
        let resolver = resolver_at_epoch_one(128);

        let duties = resolver
            .attester_duties(1, &[0])
            .await
            .expect("validator 0 is active");

        // 128 validators in 32 slots form one 4-member committee per slot.
        // The epoch 1 shuffling rotates the index list left by one, putting
        // validator 0 at position 127: the last committee of the epoch.
        assert_eq!(
            duties.data,
            [AttesterDuty {
                pubkey: validator(0).pubkey,
                validator_index: 0,
                committee_index: 0,
                committee_length: 4,
                committees_at_slot: 1,
                validator_committee_index: 3,
                slot: 63,
            }],
        );
    }

    #[tokio::test]
    async fn attester_duties_reject_epochs_after_next() {
        let resolver = resolver_at_epoch_one(128);

        let error = resolver
            .attester_duties(3, &[0])
            .await
            .expect_err("epoch 3 is past the next epoch");

        assert_eq!(
            error.to_string(),
            "Request epoch 3 can not be greater than next epoch 2",
        );
    }

    #[tokio::test]
    async fn attester_duties_reject_unknown_indices() {
        let resolver = resolver_at_epoch_one(128);

        let error = resolver
            .attester_duties(1, &[500])
            .await
            .expect_err("validator 500 does not exist");

        assert_eq!(error.to_string(), "Invalid validator index");
    }

    #[tokio::test]
    async fn inactive_validators_are_omitted_without_error() {
        let current_slot = SLOTS_PER_EPOCH + 5;
        let mut state = state_at_slot(SLOTS_PER_EPOCH, 128);
        state.validators[7].activation_epoch = 1000;

        let controller = TestController {
            current_slot,
            states: HashMap::from([(1, Arc::new(state))]),
            optimistic: false,
        };

        let resolver = DutyResolver::new(Arc::new(controller), Arc::new(RotatingShuffling));

        let duties = resolver
            .attester_duties(1, &[6, 7, 8])
            .await
            .expect("index 7 exists even though it is inactive");

        let indices = duties
            .data
            .iter()
            .map(|duty| duty.validator_index)
            .collect::<Vec<_>>();

        assert!(indices.contains(&6));
        assert!(indices.contains(&8));
        assert!(!indices.contains(&7));
    }

    #[tokio::test]
    async fn attester_duties_are_idempotent() {
        let resolver = resolver_at_epoch_one(64);
        let indices = (0..64).collect::<Vec<_>>();

        let first = resolver.attester_duties(1, &indices).await.unwrap();
        let second = resolver.attester_duties(1, &indices).await.unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap(),
        );
    }

    #[tokio::test]
    async fn proposer_duties_cover_every_slot_in_ascending_order() {
        let resolver = resolver_at_epoch_one(128);

        let duties = resolver.proposer_duties(1).await.unwrap();

        let slots = duties.data.iter().map(|duty| duty.slot).collect::<Vec<_>>();
        assert_eq!(slots, misc::slots_in_epoch(1).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn next_epoch_proposer_duties_use_the_current_epoch_state() {
        // Only the current epoch's state exists. If the lookahead path asked
        // for the next epoch's state the call would fail.
        let resolver = resolver_at_epoch_one(128);

        let duties = resolver.proposer_duties(2).await.unwrap();

        assert_eq!(duties.data.len(), SLOTS_PER_EPOCH as usize);
        assert!(duties
            .data
            .iter()
            .all(|duty| misc::compute_epoch_at_slot(duty.slot) == 2));
    }

    fn sync_committee_with_duplicates(member: &Validator) -> SyncCommittee {
        // The member's key occupies positions 0, 130 and 400.
        let mut pubkeys = (0..512u64)
            .map(|position| {
                let mut pubkey = [0xff; 48];
                pubkey[..8].copy_from_slice(&(position + 10_000).to_le_bytes());
                pubkey.into()
            })
            .collect::<Vec<bls::PublicKeyBytes>>();

        pubkeys[0] = member.pubkey;
        pubkeys[130] = member.pubkey;
        pubkeys[400] = member.pubkey;

        SyncCommittee {
            pubkeys: pubkeys
                .try_into()
                .expect("pubkey count matches sync committee size"),
            aggregate_pubkey: member.pubkey,
        }
    }

    #[tokio::test]
    async fn repeated_sync_committee_pubkeys_yield_one_duty_with_sorted_positions() {
        let mut state = state_at_slot(SLOTS_PER_EPOCH, 128);
        let committee = sync_committee_with_duplicates(&state.validators[3]);
        state.current_sync_committee = Some(committee.clone());
        state.next_sync_committee = Some(committee);

        let controller = TestController {
            current_slot: SLOTS_PER_EPOCH + 5,
            states: HashMap::from([(1, Arc::new(state))]),
            optimistic: false,
        };

        let resolver = DutyResolver::new(Arc::new(controller), Arc::new(RotatingShuffling));

        let duties = resolver.sync_committee_duties(1, &[3, 4]).await.unwrap();

        assert_eq!(duties.value.len(), 1, "validator 4 is not in the committee");
        assert_eq!(duties.value[0].validator_index, 3);
        assert_eq!(duties.value[0].validator_sync_committee_indices, [0, 130, 400]);
    }

    #[tokio::test]
    async fn sync_committee_duties_respect_the_last_valid_epoch() {
        let mut state = state_at_slot(SLOTS_PER_EPOCH, 128);
        let committee = sync_committee_with_duplicates(&state.validators[3]);
        state.current_sync_committee = Some(committee.clone());
        state.next_sync_committee = Some(committee);

        let controller = TestController {
            current_slot: SLOTS_PER_EPOCH + 5,
            states: HashMap::from([(1, Arc::new(state))]),
            optimistic: false,
        };

        let resolver = DutyResolver::new(Arc::new(controller), Arc::new(RotatingShuffling));

        let last_valid = misc::sync_committee_duties_last_valid_epoch(1);

        assert!(resolver
            .sync_committee_duties(last_valid, &[3])
            .await
            .is_ok());

        let error = resolver
            .sync_committee_duties(last_valid + 1, &[3])
            .await
            .expect_err("epoch is past the next sync committee period");

        assert_eq!(
            error.to_string(),
            format!("Epoch is too far in the future. Maximum valid epoch is {last_valid}."),
        );
    }

    #[tokio::test]
    async fn pre_altair_states_yield_no_sync_committee_duties() {
        let resolver = resolver_at_epoch_one(128);

        let duties = resolver.sync_committee_duties(1, &[0]).await.unwrap();

        assert!(duties.value.is_empty());
    }
}
