pub use alloy_primitives::{Address as ExecutionAddress, B256 as H256, U256 as Uint256};

pub type CommitteeIndex = u64;
pub type DepositIndex = u64;
pub type Epoch = u64;
pub type ExecutionBlockHash = H256;
pub type ExecutionBlockNumber = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type SubnetId = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
