use bls::SignatureBytes;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{
    altair::containers::SyncAggregate,
    bellatrix::primitives::{Gas, Transaction},
    capella::containers::{SignedBlsToExecutionChange, Withdrawal},
    deneb::primitives::{BlobIndex, KzgCommitment, KzgProof},
    phase0::{
        containers::{
            Attestation, AttesterSlashing, Deposit, Eth1Data, ProposerSlashing,
            SignedVoluntaryExit,
        },
        primitives::{
            ExecutionAddress, ExecutionBlockHash, ExecutionBlockNumber, Slot, Uint256, UnixSeconds,
            ValidatorIndex, H256,
        },
    },
    preset::{
        BytesPerLogsBloom, MaxAttestations, MaxAttesterSlashings, MaxBlobCommitmentsPerBlock,
        MaxBlobsPerBlock, MaxBlsToExecutionChanges, MaxDeposits, MaxExtraDataBytes,
        MaxProposerSlashings, MaxTransactionsPerPayload, MaxVoluntaryExits,
        MaxWithdrawalsPerPayload,
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
    pub execution_payload: ExecutionPayload,
    pub bls_to_execution_changes: VariableList<SignedBlsToExecutionChange, MaxBlsToExecutionChanges>,
    pub blob_kzg_commitments: VariableList<KzgCommitment, MaxBlobCommitmentsPerBlock>,
}

/// The block produced for a Deneb slot together with the sidecars the proposer
/// must publish alongside it. The sidecar list parallels
/// `body.blob_kzg_commitments` and is bounded by `MaxBlobsPerBlock`.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlockAndBlobSidecars {
    pub block: BeaconBlock,
    pub blob_sidecars: VariableList<BlobSidecar, MaxBlobsPerBlock>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BlindedBeaconBlock {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BlindedBeaconBlockBody,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BlindedBeaconBlockAndBlobSidecars {
    pub blinded_block: BlindedBeaconBlock,
    pub blinded_blob_sidecars: VariableList<BlindedBlobSidecar, MaxBlobsPerBlock>,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BlindedBeaconBlockBody {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub proposer_slashings: VariableList<ProposerSlashing, MaxProposerSlashings>,
    pub attester_slashings: VariableList<AttesterSlashing, MaxAttesterSlashings>,
    pub attestations: VariableList<Attestation, MaxAttestations>,
    pub deposits: VariableList<Deposit, MaxDeposits>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, MaxVoluntaryExits>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload_header: ExecutionPayloadHeader,
    pub bls_to_execution_changes: VariableList<SignedBlsToExecutionChange, MaxBlsToExecutionChanges>,
    pub blob_kzg_commitments: VariableList<KzgCommitment, MaxBlobCommitmentsPerBlock>,
}

/// A blob sidecar with the blob body replaced by its root. Used when the
/// payload (and blobs) come from an external builder.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BlindedBlobSidecar {
    pub block_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: BlobIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    pub block_parent_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: ValidatorIndex,
    pub blob_root: H256,
    pub kzg_commitment: KzgCommitment,
    pub kzg_proof: KzgProof,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BlobSidecar {
    pub block_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: BlobIndex,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    pub block_parent_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: ValidatorIndex,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub blob: FixedVector<u8, crate::preset::BytesPerBlob>,
    pub kzg_commitment: KzgCommitment,
    pub kzg_proof: KzgProof,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct ExecutionPayload {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub logs_bloom: FixedVector<u8, BytesPerLogsBloom>,
    pub prev_randao: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub block_number: ExecutionBlockNumber,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_limit: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_used: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub timestamp: UnixSeconds,
    #[serde(with = "ssz_types::serde_utils::hex_var_list")]
    pub extra_data: VariableList<u8, MaxExtraDataBytes>,
    pub base_fee_per_gas: Uint256,
    pub block_hash: ExecutionBlockHash,
    pub transactions: VariableList<Transaction, MaxTransactionsPerPayload>,
    pub withdrawals: VariableList<Withdrawal, MaxWithdrawalsPerPayload>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub blob_gas_used: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub excess_blob_gas: Gas,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: ExecutionBlockHash,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub logs_bloom: FixedVector<u8, BytesPerLogsBloom>,
    pub prev_randao: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub block_number: ExecutionBlockNumber,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_limit: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_used: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub timestamp: UnixSeconds,
    #[serde(with = "ssz_types::serde_utils::hex_var_list")]
    pub extra_data: VariableList<u8, MaxExtraDataBytes>,
    pub base_fee_per_gas: Uint256,
    pub block_hash: ExecutionBlockHash,
    pub transactions_root: H256,
    pub withdrawals_root: H256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub blob_gas_used: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub excess_blob_gas: Gas,
}
