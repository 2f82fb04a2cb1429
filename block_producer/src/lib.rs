pub use crate::{
    block_producer::{BlockProducer, Error, Options},
    misc::{GenericBeaconBlock, ProducedBeaconBlock, ProducedBlindedBeaconBlock, ProposerData},
    payload_id_cache::{PayloadId, PayloadIdCache, PayloadIdEntry},
    traits::{BlockBuildRequest, BlockConstructor, BlockFormat, BuilderApi, ExecutionEngine},
};

#[allow(clippy::module_inception)]
mod block_producer;
mod misc;
mod payload_id_cache;
mod traits;
