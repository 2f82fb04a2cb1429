use core::time::Duration;
use std::{collections::HashMap, sync::Arc};

use anyhow::Error as AnyhowError;
use chain::Controller;
use log::{info, warn};
use ssz_types::VariableList;
use thiserror::Error;
use tokio::{sync::Mutex, time::timeout};
use types::{
    bellatrix::containers::SignedValidatorRegistrationV1,
    combined::{BeaconBlock, BlindedBeaconBlock},
    config::Config,
    deneb::containers::{BeaconBlockAndBlobSidecars, BlindedBeaconBlockAndBlobSidecars},
    nonstandard::Phase,
    phase0::primitives::{Epoch, ExecutionAddress, Slot, ValidatorIndex, H256},
};

use bls::SignatureBytes;

use crate::{
    misc::{GenericBeaconBlock, ProducedBeaconBlock, ProducedBlindedBeaconBlock, ProposerData},
    payload_id_cache::{PayloadIdCache, PayloadIdEntry},
    traits::{BlockBuildRequest, BlockConstructor, BlockFormat, BuilderApi, ExecutionEngine},
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Error)]
pub enum Error {
    #[error("Block builder not configured")]
    NoBuilderConfigured,
    #[error("The node is currently optimistic and cannot serve validators")]
    NodeIsOptimistic,
    #[error("Prepared {0:?} beacon block is blinded")]
    PreparedBlockIsBlinded(Phase),
    #[error("Prepared {0:?} beacon block is not blinded")]
    PreparedBlockIsNotBlinded(Phase),
    #[error("produced block carries {count} blob sidecars, more than a block may have")]
    TooManyBlobSidecars { count: usize },
    #[error("Could not register block builder")]
    RegisterValidators(#[source] AnyhowError),
    #[error("deadline exceeded while calling a collaborator")]
    DeadlineExceeded,
    #[error(transparent)]
    Internal(#[from] AnyhowError),
}

pub struct Options {
    pub default_fee_recipient: ExecutionAddress,
    pub request_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            default_fee_recipient: ExecutionAddress::ZERO,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct BlockProducer {
    producer_context: Arc<ProducerContext>,
}

struct ProducerContext {
    chain_config: Arc<Config>,
    controller: Arc<dyn Controller>,
    block_constructor: Arc<dyn BlockConstructor>,
    execution_engine: Arc<dyn ExecutionEngine>,
    builder_api: Option<Arc<dyn BuilderApi>>,
    default_fee_recipient: ExecutionAddress,
    request_timeout: Duration,
    prepared_proposers: Mutex<HashMap<ValidatorIndex, ExecutionAddress>>,
    payload_id_cache: PayloadIdCache,
}

impl BlockProducer {
    #[must_use]
    pub fn new(
        chain_config: Arc<Config>,
        controller: Arc<dyn Controller>,
        block_constructor: Arc<dyn BlockConstructor>,
        execution_engine: Arc<dyn ExecutionEngine>,
        builder_api: Option<Arc<dyn BuilderApi>>,
        options: Options,
    ) -> Self {
        let Options {
            default_fee_recipient,
            request_timeout,
        } = options;

        let producer_context = Arc::new(ProducerContext {
            chain_config,
            controller,
            block_constructor,
            execution_engine,
            builder_api,
            default_fee_recipient,
            request_timeout,
            prepared_proposers: Mutex::new(HashMap::new()),
            payload_id_cache: PayloadIdCache::new(),
        });

        Self { producer_context }
    }

    #[must_use]
    pub fn builder_configured(&self) -> bool {
        self.producer_context.builder_api.is_some()
    }

    pub async fn add_new_prepared_proposers(
        &self,
        proposers: impl IntoIterator<Item = ProposerData> + Send,
    ) {
        let mut prepared_proposers = self.producer_context.prepared_proposers.lock().await;

        for proposer in proposers {
            prepared_proposers.insert(proposer.validator_index, proposer.fee_recipient);
        }
    }

    pub async fn prepared_fee_recipient(
        &self,
        validator_index: ValidatorIndex,
    ) -> ExecutionAddress {
        self.producer_context
            .prepared_proposers
            .lock()
            .await
            .get(&validator_index)
            .copied()
            .unwrap_or(self.producer_context.default_fee_recipient)
    }

    #[must_use]
    pub fn cached_payload_id(&self, slot: Slot, parent_root: H256) -> Option<PayloadIdEntry> {
        self.producer_context.payload_id_cache.get(slot, parent_root)
    }

    pub async fn produce_beacon_block(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<ProducedBeaconBlock, Error> {
        // The local payload cannot be trusted while the head is unverified.
        if self.producer_context.controller.is_optimistic() {
            return Err(Error::NodeIsOptimistic);
        }

        let generic_block = self
            .fetch_generic_block(slot, randao_reveal, graffiti, BlockFormat::Full)
            .await?;

        select_full_variant(generic_block)
    }

    pub async fn produce_blinded_beacon_block(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<ProducedBlindedBeaconBlock, Error> {
        // Before Bellatrix there is no payload, so there is nothing for a
        // builder to supply and nothing unverified to gate on.
        if self.producer_context.chain_config.phase_at_slot(slot) < Phase::Bellatrix {
            let generic_block = self
                .fetch_generic_block(slot, randao_reveal, graffiti, BlockFormat::Full)
                .await?;

            return select_blinded_variant(generic_block);
        }

        if self.producer_context.builder_api.is_none() {
            return Err(Error::NoBuilderConfigured);
        }

        // Unlike the full path, an optimistic head does not gate this one.
        // The payload comes from the builder, not the unverified local view.
        let generic_block = self
            .fetch_generic_block(slot, randao_reveal, graffiti, BlockFormat::Blinded)
            .await?;

        select_blinded_variant(generic_block)
    }

    /// Hands upcoming proposals to the execution engine and remembers the
    /// returned payload IDs. Called after proposer duties are computed for
    /// `epoch`; also prunes cache entries older than `epoch`.
    pub async fn prime_payload_ids(
        &self,
        epoch: Epoch,
        proposers: impl IntoIterator<Item = (Slot, ValidatorIndex)> + Send,
        head_block_root: H256,
    ) {
        let context = &self.producer_context;

        context.payload_id_cache.prune_before(epoch);

        let current_slot = context.controller.slot();

        for (slot, proposer_index) in proposers {
            if slot < current_slot {
                continue;
            }

            let fee_recipient = self.prepared_fee_recipient(proposer_index).await;

            let payload_id = timeout(
                context.request_timeout,
                context
                    .execution_engine
                    .notify_payload_attributes(slot, head_block_root, fee_recipient),
            )
            .await;

            match payload_id {
                Ok(Ok(Some(payload_id))) => {
                    info!(
                        "started work on execution payload with id {payload_id:?} \
                         for head {head_block_root:?} at slot {slot}",
                    );

                    context.payload_id_cache.set(
                        slot,
                        head_block_root,
                        proposer_index,
                        payload_id,
                        fee_recipient,
                    );
                }
                Ok(Ok(None)) => warn!(
                    "could not prepare execution payload for slot {slot}: payload_id is None; \
                     ensure that multiple consensus clients are not driving the same execution client",
                ),
                Ok(Err(error)) => warn!("error while preparing execution payload: {error:?}"),
                Err(_) => warn!("timed out preparing execution payload for slot {slot}"),
            }
        }
    }

    pub async fn register_validators(
        &self,
        registrations: Vec<SignedValidatorRegistrationV1>,
    ) -> Result<(), Error> {
        let builder_api = self
            .producer_context
            .builder_api
            .as_ref()
            .ok_or(Error::NoBuilderConfigured)?;

        timeout(
            self.producer_context.request_timeout,
            builder_api.register_validators(&registrations),
        )
        .await
        .map_err(|_| Error::DeadlineExceeded)?
        .map_err(Error::RegisterValidators)
    }

    async fn fetch_generic_block(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
        format: BlockFormat,
    ) -> Result<GenericBeaconBlock, Error> {
        let request = BlockBuildRequest {
            slot,
            randao_reveal,
            graffiti,
            format,
        };

        timeout(
            self.producer_context.request_timeout,
            self.producer_context
                .block_constructor
                .produce_generic_block(request),
        )
        .await
        .map_err(|_| Error::DeadlineExceeded)?
        .map_err(Error::Internal)
    }
}

/// The single dispatch point from the generic block to the full response
/// shape. A blinded result cannot be served here; it is reported, never
/// coerced.
fn select_full_variant(generic_block: GenericBeaconBlock) -> Result<ProducedBeaconBlock, Error> {
    match generic_block {
        GenericBeaconBlock::Full {
            block,
            blob_sidecars,
        } => match block {
            BeaconBlock::Phase0(block) => Ok(ProducedBeaconBlock::Phase0(block)),
            BeaconBlock::Altair(block) => Ok(ProducedBeaconBlock::Altair(block)),
            BeaconBlock::Bellatrix(block) => Ok(ProducedBeaconBlock::Bellatrix(block)),
            BeaconBlock::Capella(block) => Ok(ProducedBeaconBlock::Capella(block)),
            BeaconBlock::Deneb(block) => {
                let count = blob_sidecars.len();

                let blob_sidecars = VariableList::new(blob_sidecars)
                    .map_err(|_| Error::TooManyBlobSidecars { count })?;

                Ok(ProducedBeaconBlock::Deneb(BeaconBlockAndBlobSidecars {
                    block,
                    blob_sidecars,
                }))
            }
        },
        GenericBeaconBlock::Blinded { block, .. } => {
            Err(Error::PreparedBlockIsBlinded(block.phase()))
        }
    }
}

/// The blinded counterpart of [`select_full_variant`]. Pre-Bellatrix blocks
/// have no payload to blind and pass through as they are.
fn select_blinded_variant(
    generic_block: GenericBeaconBlock,
) -> Result<ProducedBlindedBeaconBlock, Error> {
    match generic_block {
        GenericBeaconBlock::Full { block, .. } => match block {
            BeaconBlock::Phase0(block) => Ok(ProducedBlindedBeaconBlock::Phase0(block)),
            BeaconBlock::Altair(block) => Ok(ProducedBlindedBeaconBlock::Altair(block)),
            BeaconBlock::Bellatrix(_) | BeaconBlock::Capella(_) | BeaconBlock::Deneb(_) => {
                Err(Error::PreparedBlockIsNotBlinded(block.phase()))
            }
        },
        GenericBeaconBlock::Blinded {
            block,
            blinded_blob_sidecars,
        } => match block {
            BlindedBeaconBlock::Bellatrix(block) => {
                Ok(ProducedBlindedBeaconBlock::Bellatrix(block))
            }
            BlindedBeaconBlock::Capella(block) => Ok(ProducedBlindedBeaconBlock::Capella(block)),
            BlindedBeaconBlock::Deneb(block) => {
                let count = blinded_blob_sidecars.len();

                let blinded_blob_sidecars = VariableList::new(blinded_blob_sidecars)
                    .map_err(|_| Error::TooManyBlobSidecars { count })?;

                Ok(ProducedBlindedBeaconBlock::Deneb(
                    BlindedBeaconBlockAndBlobSidecars {
                        blinded_block: block,
                        blinded_blob_sidecars,
                    },
                ))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result as AnyhowResult;
    use async_trait::async_trait;
    use chain::HeadInfo;
    use parking_lot::Mutex as SyncMutex;
    use types::{
        bellatrix::containers::{
            BeaconBlock as BellatrixBeaconBlock, BlindedBeaconBlock as BellatrixBlindedBeaconBlock,
        },
        combined::BeaconState,
        deneb::containers::{BeaconBlock as DenebBeaconBlock, BlobSidecar},
        nonstandard::WithStatus,
        phase0::containers::BeaconBlock as Phase0BeaconBlock,
    };

    use crate::payload_id_cache::PayloadId;

    use super::*;

    const HEAD_ROOT: H256 = H256::repeat_byte(0xaa);

    struct TestController {
        current_slot: Slot,
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
            Ok(WithStatus::valid(Arc::new(BeaconState::default()), false))
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

    struct TestConstructor {
        block: GenericBeaconBlock,
    }

    #[async_trait]
    impl BlockConstructor for TestConstructor {
        async fn produce_generic_block(
            &self,
            _request: BlockBuildRequest,
        ) -> AnyhowResult<GenericBeaconBlock> {
            Ok(self.block.clone())
        }
    }

    #[derive(Default)]
    struct TestEngine {
        requests: SyncMutex<Vec<(Slot, H256, ExecutionAddress)>>,
    }

    #[async_trait]
    impl ExecutionEngine for TestEngine {
        async fn notify_payload_attributes(
            &self,
            slot: Slot,
            head_block_root: H256,
            fee_recipient: ExecutionAddress,
        ) -> AnyhowResult<Option<PayloadId>> {
            self.requests.lock().push((slot, head_block_root, fee_recipient));
            Ok(Some(PayloadId::repeat_byte(slot as u8)))
        }
    }

    struct TestBuilder;

    #[async_trait]
    impl BuilderApi for TestBuilder {
        async fn register_validators(
            &self,
            _registrations: &[SignedValidatorRegistrationV1],
        ) -> AnyhowResult<()> {
            Ok(())
        }
    }

    fn full_bellatrix_block() -> GenericBeaconBlock {
        GenericBeaconBlock::Full {
            block: BeaconBlock::Bellatrix(BellatrixBeaconBlock::default()),
            blob_sidecars: vec![],
        }
    }

    fn blinded_bellatrix_block() -> GenericBeaconBlock {
        GenericBeaconBlock::Blinded {
            block: BlindedBeaconBlock::Bellatrix(BellatrixBlindedBeaconBlock::default()),
            blinded_blob_sidecars: vec![],
        }
    }

    fn producer(
        block: GenericBeaconBlock,
        optimistic: bool,
        with_builder: bool,
    ) -> (BlockProducer, Arc<TestEngine>) {
        let engine = Arc::new(TestEngine::default());

        let builder_api: Option<Arc<dyn BuilderApi>> = with_builder
            .then(|| Arc::new(TestBuilder) as Arc<dyn BuilderApi>);

        let producer = BlockProducer::new(
            Arc::new(Config::all_forks_at_genesis()),
            Arc::new(TestController {
                current_slot: 10,
                optimistic,
            }),
            Arc::new(TestConstructor { block }),
            engine.clone(),
            builder_api,
            Options::default(),
        );

        (producer, engine)
    }

    fn request_args() -> (Slot, SignatureBytes, H256) {
        (10, SignatureBytes::empty(), H256::ZERO)
    }

    #[tokio::test]
    async fn a_full_block_is_wrapped_in_its_fork_variant() {
        let (producer, _) = producer(full_bellatrix_block(), false, false);
        let (slot, randao_reveal, graffiti) = request_args();

        let produced = producer
            .produce_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect("the constructor returned a full block");

        assert_eq!(produced.phase(), Phase::Bellatrix);
    }

    #[tokio::test]
    async fn an_optimistic_head_blocks_full_production() {
        let (producer, _) = producer(full_bellatrix_block(), true, false);
        let (slot, randao_reveal, graffiti) = request_args();

        let error = producer
            .produce_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect_err("local payloads cannot be served while optimistic");

        assert_eq!(
            error.to_string(),
            "The node is currently optimistic and cannot serve validators",
        );
    }

    #[tokio::test]
    async fn blinded_production_requires_a_builder() {
        let (producer, _) = producer(blinded_bellatrix_block(), false, false);
        let (slot, randao_reveal, graffiti) = request_args();

        let error = producer
            .produce_blinded_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect_err("no builder is configured");

        assert_eq!(error.to_string(), "Block builder not configured");
    }

    #[tokio::test]
    async fn blinded_production_proceeds_while_optimistic_if_a_builder_exists() {
        let (producer, _) = producer(blinded_bellatrix_block(), true, true);
        let (slot, randao_reveal, graffiti) = request_args();

        let produced = producer
            .produce_blinded_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect("builder data does not depend on the unverified local view");

        assert_eq!(produced.phase(), Phase::Bellatrix);
    }

    #[tokio::test]
    async fn a_blinded_result_is_not_coerced_into_a_full_response() {
        let (producer, _) = producer(blinded_bellatrix_block(), false, true);
        let (slot, randao_reveal, graffiti) = request_args();

        let error = producer
            .produce_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect_err("a blinded block cannot answer a full request");

        assert_eq!(error.to_string(), "Prepared Bellatrix beacon block is blinded");
    }

    #[tokio::test]
    async fn a_full_result_is_not_coerced_into_a_blinded_response() {
        let (producer, _) = producer(full_bellatrix_block(), false, true);
        let (slot, randao_reveal, graffiti) = request_args();

        let error = producer
            .produce_blinded_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect_err("a full post-Bellatrix block cannot answer a blinded request");

        assert_eq!(
            error.to_string(),
            "Prepared Bellatrix beacon block is not blinded",
        );
    }

    #[tokio::test]
    async fn pre_bellatrix_blocks_pass_through_the_blinded_endpoint() {
        let block = GenericBeaconBlock::Full {
            block: BeaconBlock::Phase0(Phase0BeaconBlock::default()),
            blob_sidecars: vec![],
        };

        // No builder is configured. Before Bellatrix that must not matter.
        let engine = Arc::new(TestEngine::default());

        let producer = BlockProducer::new(
            Arc::new(Config::mainnet()),
            Arc::new(TestController {
                current_slot: 10,
                optimistic: false,
            }),
            Arc::new(TestConstructor { block }),
            engine,
            None,
            Options::default(),
        );

        let (slot, randao_reveal, graffiti) = request_args();

        let produced = producer
            .produce_blinded_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect("there is no payload to blind before Bellatrix");

        assert_eq!(produced.phase(), Phase::Phase0);
    }

    fn blob_sidecar(index: u64) -> BlobSidecar {
        BlobSidecar {
            block_root: H256::ZERO,
            index,
            slot: 10,
            block_parent_root: H256::ZERO,
            proposer_index: 0,
            blob: vec![0; 131_072]
                .try_into()
                .expect("blob length matches BytesPerBlob"),
            kzg_commitment: Default::default(),
            kzg_proof: Default::default(),
        }
    }

    #[tokio::test]
    async fn deneb_blocks_carry_their_sidecars_in_order() {
        let block = GenericBeaconBlock::Full {
            block: BeaconBlock::Deneb(DenebBeaconBlock::default()),
            blob_sidecars: vec![blob_sidecar(0), blob_sidecar(1)],
        };

        let (producer, _) = producer(block, false, false);
        let (slot, randao_reveal, graffiti) = request_args();

        let produced = producer
            .produce_beacon_block(slot, randao_reveal, graffiti)
            .await
            .unwrap();

        let ProducedBeaconBlock::Deneb(contents) = produced else {
            panic!("a Deneb generic block must produce a Deneb response");
        };

        let indices = contents
            .blob_sidecars
            .iter()
            .map(|sidecar| sidecar.index)
            .collect::<Vec<_>>();

        assert_eq!(indices, [0, 1]);
    }

    #[tokio::test]
    async fn sidecar_counts_above_the_maximum_are_rejected() {
        let block = GenericBeaconBlock::Full {
            block: BeaconBlock::Deneb(DenebBeaconBlock::default()),
            blob_sidecars: (0..7).map(blob_sidecar).collect(),
        };

        let (producer, _) = producer(block, false, false);
        let (slot, randao_reveal, graffiti) = request_args();

        let error = producer
            .produce_beacon_block(slot, randao_reveal, graffiti)
            .await
            .expect_err("seven sidecars exceed the per-block maximum");

        assert!(error.to_string().contains("7 blob sidecars"));
    }

    #[tokio::test]
    async fn priming_records_payload_ids_for_upcoming_proposals_only() {
        let (producer, engine) = producer(full_bellatrix_block(), false, false);

        producer
            .add_new_prepared_proposers([ProposerData {
                validator_index: 2,
                fee_recipient: ExecutionAddress::repeat_byte(2),
            }])
            .await;

        // The current slot is 10; the duty at slot 9 is already in the past.
        producer
            .prime_payload_ids(0, [(9, 1), (10, 1), (11, 2)], HEAD_ROOT)
            .await;

        assert_eq!(producer.cached_payload_id(9, HEAD_ROOT), None);

        let at_current = producer
            .cached_payload_id(10, HEAD_ROOT)
            .expect("the duty at the current slot is primed");
        assert_eq!(at_current.proposer_index, 1);
        assert_eq!(at_current.fee_recipient, ExecutionAddress::ZERO);

        let prepared = producer
            .cached_payload_id(11, HEAD_ROOT)
            .expect("the duty at the next slot is primed");
        assert_eq!(prepared.fee_recipient, ExecutionAddress::repeat_byte(2));

        assert_eq!(engine.requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn registrations_require_a_builder() {
        let (producer, _) = producer(full_bellatrix_block(), false, false);

        let error = producer
            .register_validators(vec![])
            .await
            .expect_err("no builder is configured");

        assert_eq!(error.to_string(), "Block builder not configured");
    }
}
