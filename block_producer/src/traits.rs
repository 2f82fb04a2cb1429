use anyhow::Result;
use async_trait::async_trait;
use bls::SignatureBytes;
use types::{
    bellatrix::containers::SignedValidatorRegistrationV1,
    phase0::primitives::{ExecutionAddress, Slot, H256},
};

use crate::{misc::GenericBeaconBlock, payload_id_cache::PayloadId};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockFormat {
    Full,
    Blinded,
}

#[derive(Clone, Copy, Debug)]
pub struct BlockBuildRequest {
    pub slot: Slot,
    pub randao_reveal: SignatureBytes,
    pub graffiti: H256,
    pub format: BlockFormat,
}

/// The block-construction collaborator: state transition, operation packing
/// and (for blinded requests) builder bid retrieval all happen behind this.
/// Given the request it returns a tagged block in the fork of the requested
/// slot, full or blinded depending on where the payload came from.
#[async_trait]
pub trait BlockConstructor: Send + Sync {
    async fn produce_generic_block(&self, request: BlockBuildRequest)
        -> Result<GenericBeaconBlock>;
}

/// The execution-engine client, reduced to the one call this service makes
/// itself: announcing payload attributes for an upcoming proposal so the
/// engine starts building, and reporting the payload ID to poll later.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn notify_payload_attributes(
        &self,
        slot: Slot,
        head_block_root: H256,
        fee_recipient: ExecutionAddress,
    ) -> Result<Option<PayloadId>>;
}

/// The external block-builder client. Bid retrieval happens inside the
/// block-construction collaborator; what remains here is registration
/// forwarding. Absence of a configured builder is represented by the
/// `Option` holding implementations of this trait.
#[async_trait]
pub trait BuilderApi: Send + Sync {
    async fn register_validators(
        &self,
        registrations: &[SignedValidatorRegistrationV1],
    ) -> Result<()>;
}
