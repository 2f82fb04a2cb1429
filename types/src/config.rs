use serde::Deserialize;

use crate::{
    nonstandard::Phase,
    phase0::{
        consts::GENESIS_EPOCH,
        primitives::{Epoch, Slot},
    },
    preset::SLOTS_PER_EPOCH,
};

/// Fork schedule for a chain. Phase dispatch goes through the
/// `fork_schedule` table rather than ad-hoc comparisons so that adding a fork
/// means adding one entry.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(with = "serde_utils::quoted_u64")]
    pub altair_fork_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub bellatrix_fork_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub capella_fork_epoch: Epoch,
    #[serde(with = "serde_utils::quoted_u64")]
    pub deneb_fork_epoch: Epoch,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            altair_fork_epoch: 74_240,
            bellatrix_fork_epoch: 144_896,
            capella_fork_epoch: 194_048,
            deneb_fork_epoch: 269_568,
        }
    }

    /// All forks enabled from genesis. Convenient in tests.
    #[must_use]
    pub const fn all_forks_at_genesis() -> Self {
        Self {
            altair_fork_epoch: GENESIS_EPOCH,
            bellatrix_fork_epoch: GENESIS_EPOCH,
            capella_fork_epoch: GENESIS_EPOCH,
            deneb_fork_epoch: GENESIS_EPOCH,
        }
    }

    /// Fork epochs in activation order. The last entry at or before an epoch
    /// decides the phase.
    pub fn fork_schedule(&self) -> impl DoubleEndedIterator<Item = (Epoch, Phase)> {
        [
            (GENESIS_EPOCH, Phase::Phase0),
            (self.altair_fork_epoch, Phase::Altair),
            (self.bellatrix_fork_epoch, Phase::Bellatrix),
            (self.capella_fork_epoch, Phase::Capella),
            (self.deneb_fork_epoch, Phase::Deneb),
        ]
        .into_iter()
    }

    #[must_use]
    pub fn phase_at_epoch(&self, epoch: Epoch) -> Phase {
        self.fork_schedule()
            .rev()
            .find(|(fork_epoch, _)| *fork_epoch <= epoch)
            .map_or(Phase::Phase0, |(_, phase)| phase)
    }

    #[must_use]
    pub fn phase_at_slot(&self, slot: Slot) -> Phase {
        self.phase_at_epoch(slot / SLOTS_PER_EPOCH)
    }
}
