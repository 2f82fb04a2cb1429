use bls::PublicKeyBytes;
use serde::Serialize;
use types::phase0::primitives::{CommitteeIndex, Slot, ValidatorIndex, H256};

/// Duties plus the metadata every duty response carries.
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedDuties<T> {
    pub data: Vec<T>,
    pub dependent_root: H256,
    pub execution_optimistic: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct AttesterDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub committee_index: CommitteeIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub committee_length: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub committees_at_slot: u64,
    /// Position of the validator within its committee.
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_committee_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct ProposerDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SyncCommitteeDuty {
    pub pubkey: PublicKeyBytes,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    /// Every position the validator's key occupies in the committee, in
    /// ascending order. Longer than one element if the key repeats.
    #[serde(with = "serde_utils::quoted_u64_vec")]
    pub validator_sync_committee_indices: Vec<u64>,
}
