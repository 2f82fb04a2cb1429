use bls::{PublicKeyBytes, SignatureBytes};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{
    altair::containers::SyncAggregate,
    bellatrix::primitives::{Gas, Transaction},
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
        BytesPerLogsBloom, MaxAttestations, MaxAttesterSlashings, MaxDeposits, MaxExtraDataBytes,
        MaxProposerSlashings, MaxTransactionsPerPayload, MaxVoluntaryExits,
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
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct ValidatorRegistrationV1 {
    pub fee_recipient: ExecutionAddress,
    #[serde(with = "serde_utils::quoted_u64")]
    pub gas_limit: Gas,
    #[serde(with = "serde_utils::quoted_u64")]
    pub timestamp: UnixSeconds,
    pub pubkey: PublicKeyBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct SignedValidatorRegistrationV1 {
    pub message: ValidatorRegistrationV1,
    pub signature: SignatureBytes,
}
