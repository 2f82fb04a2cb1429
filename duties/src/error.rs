use anyhow::Error as AnyhowError;
use thiserror::Error;
use types::phase0::primitives::Epoch;

#[derive(Debug, Error)]
pub enum Error {
    // The exact wording of these messages is part of the API surface.
    // Validator clients match on them.
    #[error("Request epoch {requested} can not be greater than next epoch {next}")]
    EpochAfterNext { requested: Epoch, next: Epoch },
    #[error("Epoch is too far in the future. Maximum valid epoch is {last_valid}.")]
    EpochTooFarInFuture { last_valid: Epoch },
    #[error("Invalid validator index")]
    InvalidValidatorIndex,
    #[error(transparent)]
    Internal(#[from] AnyhowError),
}
