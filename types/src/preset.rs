//! Mainnet preset sizes.
//!
//! Only the mainnet preset is in scope, so these are plain constants and
//! `typenum` aliases rather than an abstraction over multiple presets.

pub use ssz_types::typenum::{
    U1048576, U1073741824, U12, U128, U131072, U16, U2, U2048, U256, U32, U4096, U512, U6, U64,
};

use crate::phase0::primitives::Epoch;

pub type MaxValidatorsPerCommittee = U2048;
pub type MaxProposerSlashings = U16;
pub type MaxAttesterSlashings = U2;
pub type MaxAttestations = U128;
pub type MaxDeposits = U16;
pub type MaxVoluntaryExits = U16;
pub type MaxBlsToExecutionChanges = U16;
pub type MaxBlobsPerBlock = U6;
pub type MaxBlobCommitmentsPerBlock = U4096;
pub type MaxBytesPerTransaction = U1073741824;
pub type MaxTransactionsPerPayload = U1048576;
pub type MaxExtraDataBytes = U32;
pub type MaxWithdrawalsPerPayload = U16;
pub type BytesPerLogsBloom = U256;
pub type BytesPerBlob = U131072;
pub type DepositContractTreeDepth = U32;
pub type SyncCommitteeSize = U512;
pub type SyncSubcommitteeSize = U128;

pub const SLOTS_PER_EPOCH: u64 = 32;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;
pub const EPOCHS_PER_HISTORICAL_VECTOR: u64 = 65536;
pub const TARGET_COMMITTEE_SIZE: u64 = 128;
pub const MAX_COMMITTEES_PER_SLOT: u64 = 64;
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: Epoch = 256;
pub const SECONDS_PER_SLOT: u64 = 12;
pub const SYNC_COMMITTEE_SIZE: u64 = 512;
pub const SYNC_SUBCOMMITTEE_SIZE: u64 = 128;
