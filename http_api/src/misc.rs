use core::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use types::{
    altair::containers::SignedContributionAndProof, phase0::containers::SignedAggregateAndProof,
};

pub const ETH_CONSENSUS_VERSION: &str = "eth-consensus-version";

const ORDERING: Ordering = Ordering::SeqCst;

#[derive(Default)]
pub struct SyncedStatus(AtomicBool);

impl SyncedStatus {
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    pub fn get(&self) -> bool {
        self.0.load(ORDERING)
    }

    pub fn set(&self, value: bool) {
        self.0.store(value, ORDERING);
    }
}

/// The gossip publisher. Broadcasting happens on the P2P side; submission
/// endpoints only hand messages over and report failures.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish_aggregate_and_proof(
        &self,
        aggregate_and_proof: &SignedAggregateAndProof,
    ) -> Result<()>;

    async fn publish_contribution_and_proof(
        &self,
        contribution_and_proof: &SignedContributionAndProof,
    ) -> Result<()>;
}
