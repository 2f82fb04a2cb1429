use helper_functions::misc;
use types::phase0::primitives::Epoch;

/// Where a requested epoch falls relative to the sync committee periods the
/// chain can answer for.
///
/// The state at the clamped epoch knows two committees: its own period's and
/// the next period's. Anything later is unanswerable until the committees
/// rotate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SyncCommitteeEpochRelation {
    CurrentPeriod,
    NextPeriod,
    Invalid,
}

impl SyncCommitteeEpochRelation {
    #[must_use]
    pub fn classify(requested_epoch: Epoch, current_epoch: Epoch) -> Self {
        let last_valid_epoch = misc::sync_committee_duties_last_valid_epoch(current_epoch);

        if requested_epoch > last_valid_epoch {
            return Self::Invalid;
        }

        let current_period = misc::sync_committee_period(current_epoch);
        let requested_period = misc::sync_committee_period(requested_epoch);

        if requested_period > current_period {
            Self::NextPeriod
        } else {
            Self::CurrentPeriod
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    // Current epoch 300 is in period 1, which spans epochs [256, 512).
    #[test_case(100, 300, SyncCommitteeEpochRelation::CurrentPeriod; "past epoch")]
    #[test_case(300, 300, SyncCommitteeEpochRelation::CurrentPeriod)]
    #[test_case(511, 300, SyncCommitteeEpochRelation::CurrentPeriod; "end of current period")]
    #[test_case(512, 300, SyncCommitteeEpochRelation::NextPeriod)]
    #[test_case(767, 300, SyncCommitteeEpochRelation::NextPeriod; "last valid epoch")]
    #[test_case(768, 300, SyncCommitteeEpochRelation::Invalid; "one past last valid epoch")]
    fn classification(requested: Epoch, current: Epoch, expected: SyncCommitteeEpochRelation) {
        assert_eq!(
            SyncCommitteeEpochRelation::classify(requested, current),
            expected,
        );
    }
}
