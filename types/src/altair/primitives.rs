pub type SubcommitteeIndex = u64;
pub type SyncCommitteePeriod = u64;
