//! The narrow interface to the fork-choice and state-transition layer.
//!
//! Everything this service knows about the chain comes through
//! [`Controller`]: the wall-clock slot, the head, and read-only state
//! snapshots. State advancing with empty-slot processing happens behind
//! [`Controller::state_at_epoch_start`]; this service only decides *which*
//! epoch to ask for.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use types::{
    combined::BeaconState,
    nonstandard::WithStatus,
    phase0::primitives::{Epoch, Slot, UnixSeconds, H256},
};

#[derive(Clone, Copy, Debug)]
pub struct HeadInfo {
    pub block_root: H256,
    pub slot: Slot,
    /// Whether the head block's execution payload has not yet been validated
    /// by the execution engine.
    pub optimistic: bool,
}

#[async_trait]
pub trait Controller: Send + Sync {
    /// The current wall-clock slot.
    fn slot(&self) -> Slot;

    fn genesis_time(&self) -> UnixSeconds;

    fn head(&self) -> HeadInfo;

    fn is_optimistic(&self) -> bool {
        self.head().optimistic
    }

    async fn head_state(&self) -> Result<WithStatus<Arc<BeaconState>>>;

    /// A snapshot at the start slot of `epoch`, produced by advancing the
    /// canonical state with empty-slot transitions if no block exists there.
    ///
    /// `epoch` must not be later than the current epoch; lookahead for the
    /// next epoch is done by the caller against the current epoch's snapshot.
    async fn state_at_epoch_start(&self, epoch: Epoch) -> Result<WithStatus<Arc<BeaconState>>>;

    /// The canonical state at `slot`, if the slot is within the retained
    /// range.
    async fn state_at_slot(&self, slot: Slot) -> Result<Option<WithStatus<Arc<BeaconState>>>>;
}
