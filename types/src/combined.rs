use serde::Serialize;
use ssz::Encode;

use crate::{
    altair::containers::{BeaconBlock as AltairBeaconBlock, SyncCommittee},
    bellatrix::containers::{
        BeaconBlock as BellatrixBeaconBlock, BlindedBeaconBlock as BellatrixBlindedBeaconBlock,
    },
    capella::containers::{
        BeaconBlock as CapellaBeaconBlock, BlindedBeaconBlock as CapellaBlindedBeaconBlock,
    },
    deneb::containers::{
        BeaconBlock as DenebBeaconBlock, BlindedBeaconBlock as DenebBlindedBeaconBlock,
    },
    nonstandard::{Phase, SyncCommitteeEpoch},
    phase0::{
        containers::{BeaconBlock as Phase0BeaconBlock, Checkpoint, Validator},
        primitives::{Slot, H256},
    },
};

/// Read-only chain-state snapshot handed over by the state-transition engine.
///
/// This is not the full consensus state. It carries exactly the fields duty
/// resolution and aggregation need; everything else stays behind the
/// state-transition collaborator.
#[derive(Clone, Debug, Default)]
pub struct BeaconState {
    pub slot: Slot,
    pub validators: Vec<Validator>,
    /// Recent block roots, indexed by `slot % len`.
    pub block_roots: Vec<H256>,
    /// Randao mixes, indexed by `epoch % len`. Seeds for the external
    /// shuffling dependency.
    pub randao_mixes: Vec<H256>,
    pub current_justified_checkpoint: Checkpoint,
    /// `None` before Altair.
    pub current_sync_committee: Option<SyncCommittee>,
    pub next_sync_committee: Option<SyncCommittee>,
}

impl BeaconState {
    #[must_use]
    pub const fn sync_committee(&self, epoch: SyncCommitteeEpoch) -> Option<&SyncCommittee> {
        match epoch {
            SyncCommitteeEpoch::Current => self.current_sync_committee.as_ref(),
            SyncCommitteeEpoch::Next => self.next_sync_committee.as_ref(),
        }
    }
}

/// An unsigned block in any of the five phases. Exactly one variant is ever
/// populated; dispatch happens in one place per caller via `match`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(untagged)]
pub enum BeaconBlock {
    Phase0(Phase0BeaconBlock),
    Altair(AltairBeaconBlock),
    Bellatrix(BellatrixBeaconBlock),
    Capella(CapellaBeaconBlock),
    Deneb(DenebBeaconBlock),
}

impl BeaconBlock {
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

    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Phase0(block) => block.slot,
            Self::Altair(block) => block.slot,
            Self::Bellatrix(block) => block.slot,
            Self::Capella(block) => block.slot,
            Self::Deneb(block) => block.slot,
        }
    }

    #[must_use]
    pub fn to_ssz(&self) -> Vec<u8> {
        match self {
            Self::Phase0(block) => block.as_ssz_bytes(),
            Self::Altair(block) => block.as_ssz_bytes(),
            Self::Bellatrix(block) => block.as_ssz_bytes(),
            Self::Capella(block) => block.as_ssz_bytes(),
            Self::Deneb(block) => block.as_ssz_bytes(),
        }
    }
}

/// An unsigned blinded block: the execution payload is replaced by its
/// header. Only exists from Bellatrix on.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(untagged)]
pub enum BlindedBeaconBlock {
    Bellatrix(BellatrixBlindedBeaconBlock),
    Capella(CapellaBlindedBeaconBlock),
    Deneb(DenebBlindedBeaconBlock),
}

impl BlindedBeaconBlock {
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Bellatrix(_) => Phase::Bellatrix,
            Self::Capella(_) => Phase::Capella,
            Self::Deneb(_) => Phase::Deneb,
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Bellatrix(block) => block.slot,
            Self::Capella(block) => block.slot,
            Self::Deneb(block) => block.slot,
        }
    }

    #[must_use]
    pub fn to_ssz(&self) -> Vec<u8> {
        match self {
            Self::Bellatrix(block) => block.as_ssz_bytes(),
            Self::Capella(block) => block.as_ssz_bytes(),
            Self::Deneb(block) => block.as_ssz_bytes(),
        }
    }
}
