use enum_iterator::Sequence;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Sequence,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Phase {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
}

#[derive(Clone, Copy)]
pub enum SyncCommitteeEpoch {
    Current,
    Next,
}

#[derive(Clone, Copy, Debug)]
pub struct WithStatus<T> {
    pub value: T,
    pub optimistic: bool,
    pub finalized: bool,
}

/// [`WithStatus`] has no constructor accepting values for all of its fields.
/// Anonymous arguments can lead to bugs when multiple of them have the same
/// type, and mixing up the two [`bool`] fields here would be particularly
/// dangerous.
impl<T> WithStatus<T> {
    #[must_use]
    pub const fn valid(value: T, finalized: bool) -> Self {
        Self {
            value,
            optimistic: false,
            finalized,
        }
    }

    #[must_use]
    pub const fn optimistic(value: T) -> Self {
        Self {
            value,
            optimistic: true,
            finalized: false,
        }
    }

    pub fn map<U>(self, function: impl FnOnce(T) -> U) -> WithStatus<U> {
        let Self {
            value,
            optimistic,
            finalized,
        } = self;

        WithStatus {
            value: function(value),
            optimistic,
            finalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_string_forms_round_trip() {
        assert_eq!(Phase::Bellatrix.to_string(), "bellatrix");
        assert_eq!("deneb".parse(), Ok(Phase::Deneb));
        assert_eq!(Phase::Phase0.as_ref(), "phase0");
    }
}
