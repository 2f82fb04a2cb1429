pub use crate::{
    containers::{AttesterDuty, ProposerDuty, ResolvedDuties, SyncCommitteeDuty},
    error::Error,
    resolver::DutyResolver,
    sync_committee_periods::SyncCommitteeEpochRelation,
};

mod containers;
mod error;
mod resolver;
mod sync_committee_periods;
