use serde::{Deserialize, Serialize};
use types::{
    altair::containers::BeaconBlock as AltairBeaconBlock,
    bellatrix::containers::{
        BeaconBlock as BellatrixBeaconBlock, BlindedBeaconBlock as BellatrixBlindedBeaconBlock,
    },
    capella::containers::{
        BeaconBlock as CapellaBeaconBlock, BlindedBeaconBlock as CapellaBlindedBeaconBlock,
    },
    combined::{BeaconBlock, BlindedBeaconBlock},
    deneb::containers::{
        BeaconBlockAndBlobSidecars, BlindedBeaconBlockAndBlobSidecars, BlindedBlobSidecar,
        BlobSidecar,
    },
    nonstandard::Phase,
    phase0::{
        containers::BeaconBlock as Phase0BeaconBlock,
        primitives::{ExecutionAddress, ValidatorIndex},
    },
};

use ssz::Encode;

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposerData {
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    pub fee_recipient: ExecutionAddress,
}

/// What the block-construction collaborator hands back: a block in the fork
/// of the requested slot, either with a full payload or blinded, plus the
/// blob bundle from Deneb on. The sidecar list is empty before Deneb and
/// parallels the block's commitments after it.
#[derive(Clone, Debug)]
pub enum GenericBeaconBlock {
    Full {
        block: BeaconBlock,
        blob_sidecars: Vec<BlobSidecar>,
    },
    Blinded {
        block: BlindedBeaconBlock,
        blinded_blob_sidecars: Vec<BlindedBlobSidecar>,
    },
}

impl GenericBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Full { block, .. } => block.phase(),
            Self::Blinded { block, .. } => block.phase(),
        }
    }

    #[must_use]
    pub const fn is_blinded(&self) -> bool {
        matches!(self, Self::Blinded { .. })
    }
}

/// The response shape of full block production: one variant per fork, with
/// Deneb carrying its sidecars next to the block.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(untagged)]
pub enum ProducedBeaconBlock {
    Phase0(Phase0BeaconBlock),
    Altair(AltairBeaconBlock),
    Bellatrix(BellatrixBeaconBlock),
    Capella(CapellaBeaconBlock),
    Deneb(BeaconBlockAndBlobSidecars),
}

impl ProducedBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Phase0(_) => Phase::Phase0,
            Self::Altair(_) => Phase::Altair,
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
            Self::Deneb(_) => Phase::Deneb,
        }
    }
}

// The SSZ form is the same object the JSON response wraps, serialized as its
// fork-specific container with no tag of its own.
impl Encode for ProducedBeaconBlock {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        match self {
            Self::Phase0(block) => block.ssz_bytes_len(),
            Self::Altair(block) => block.ssz_bytes_len(),
            Self::Bellatrix(block) => block.ssz_bytes_len(),
            Self::Capella(block) => block.ssz_bytes_len(),
            Self::Deneb(contents) => contents.ssz_bytes_len(),
        }
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Phase0(block) => block.ssz_append(buf),
            Self::Altair(block) => block.ssz_append(buf),
            Self::Bellatrix(block) => block.ssz_append(buf),
            Self::Capella(block) => block.ssz_append(buf),
            Self::Deneb(contents) => contents.ssz_append(buf),
        }
    }
}

/// The response shape of blinded block production. Before Bellatrix there is
/// no payload to blind, so those variants carry ordinary blocks.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(untagged)]
pub enum ProducedBlindedBeaconBlock {
    Phase0(Phase0BeaconBlock),
    Altair(AltairBeaconBlock),
    Bellatrix(BellatrixBlindedBeaconBlock),
    Capella(CapellaBlindedBeaconBlock),
    Deneb(BlindedBeaconBlockAndBlobSidecars),
}

impl ProducedBlindedBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Phase0(_) => Phase::Phase0,
            Self::Altair(_) => Phase::Altair,
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
            Self::Deneb(_) => Phase::Deneb,
        }
    }
}

impl Encode for ProducedBlindedBeaconBlock {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        match self {
            Self::Phase0(block) => block.ssz_bytes_len(),
            Self::Altair(block) => block.ssz_bytes_len(),
            Self::Bellatrix(block) => block.ssz_bytes_len(),
            Self::Capella(block) => block.ssz_bytes_len(),
            Self::Deneb(contents) => contents.ssz_bytes_len(),
        }
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Phase0(block) => block.ssz_append(buf),
            Self::Altair(block) => block.ssz_append(buf),
            Self::Bellatrix(block) => block.ssz_append(buf),
            Self::Capella(block) => block.ssz_append(buf),
            Self::Deneb(contents) => contents.ssz_append(buf),
        }
    }
}
