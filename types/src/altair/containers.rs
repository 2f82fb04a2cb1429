use bls::{PublicKeyBytes, SignatureBytes};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{
    altair::primitives::SubcommitteeIndex,
    phase0::{
        containers::{
            Attestation, AttesterSlashing, Deposit, Eth1Data, ProposerSlashing,
            SignedVoluntaryExit,
        },
        primitives::{Slot, ValidatorIndex, H256},
    },
    preset::{
        MaxAttestations, MaxAttesterSlashings, MaxDeposits, MaxProposerSlashings,
        MaxVoluntaryExits, SyncCommitteeSize, SyncSubcommitteeSize,
    },
};

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlock {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BeaconBlockBody,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub proposer_slashings: VariableList<ProposerSlashing, MaxProposerSlashings>,
    pub attester_slashings: VariableList<AttesterSlashing, MaxAttesterSlashings>,
    pub attestations: VariableList<Attestation, MaxAttestations>,
    pub deposits: VariableList<Deposit, MaxDeposits>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, MaxVoluntaryExits>,
    pub sync_aggregate: SyncAggregate,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct ContributionAndProof {
    #[serde(with = "serde_utils::quoted_u64")]
    pub aggregator_index: ValidatorIndex,
    pub contribution: SyncCommitteeContribution,
    pub selection_proof: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct SignedContributionAndProof {
    pub message: ContributionAndProof,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct SyncAggregate {
    pub sync_committee_bits: BitVector<SyncCommitteeSize>,
    pub sync_committee_signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct SyncCommittee {
    pub pubkeys: FixedVector<PublicKeyBytes, SyncCommitteeSize>,
    pub aggregate_pubkey: PublicKeyBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct SyncCommitteeContribution {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    pub beacon_block_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub subcommittee_index: SubcommitteeIndex,
    pub aggregation_bits: BitVector<SyncSubcommitteeSize>,
    pub signature: SignatureBytes,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize, Serialize, Encode, Decode, TreeHash,
)]
#[serde(deny_unknown_fields)]
pub struct SyncCommitteeMessage {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    pub beacon_block_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: ValidatorIndex,
    pub signature: SignatureBytes,
}
