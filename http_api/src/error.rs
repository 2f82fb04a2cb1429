use core::fmt::Display;
use std::{error::Error as StdError, sync::Arc};

use anyhow::Error as AnyhowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use itertools::Itertools as _;
use serde::{ser::SerializeStruct as _, Serialize, Serializer};
use thiserror::Error;
use types::phase0::primitives::Epoch;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No matching attestation found")]
    AttestationNotFound,
    #[error("Attestation slot is no longer valid from current time")]
    AttestationSlotNotValid,
    #[error(transparent)]
    BlockProducer(#[from] block_producer::Error),
    #[error("Could not broadcast one or more signed aggregated attestations")]
    BroadcastFailed,
    #[error(transparent)]
    Duties(#[from] duties::Error),
    #[error("Requested epoch cannot be in the future: {requested} > {current}")]
    EpochInFuture { requested: Epoch, current: Epoch },
    #[error("head has not been fully verified by an execution engine")]
    HeadIsOptimistic,
    #[error("internal error")]
    Internal(#[from] AnyhowError),
    #[error("invalid contribution and proofs")]
    InvalidContributionAndProofs(Vec<IndexedError>),
    #[error("invalid epoch")]
    InvalidEpoch(#[source] AnyhowError),
    #[error("invalid JSON body")]
    InvalidJsonBody(#[source] AnyhowError),
    #[error("invalid query string")]
    InvalidQuery(#[source] AnyhowError),
    #[error("invalid slot")]
    InvalidSlot(#[source] AnyhowError),
    #[error("Invalid validator index")]
    InvalidValidatorIndex,
    #[error("beacon node is currently syncing and not serving requests on this endpoint")]
    NodeIsSyncing,
    #[error("No subscriptions provided")]
    NoSubscriptionsProvided,
    #[error("Slot {slot} is too far ahead of the current slot {current_slot}")]
    SlotTooFarAhead { slot: u64, current_slot: u64 },
    #[error("No subcommittee messages found")]
    SubcommitteeMessagesNotFound,
    #[error(transparent)]
    Subscriptions(#[from] subnet_service::Error),
    #[error("Signed signatures can't be zero hashes")]
    ZeroSignature,
    #[error("Validator registration request is empty")]
    ValidatorRegistrationEmpty,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.format_sources())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let body = Json(self.body()).into_response();
        // Response extensions require `Clone` since `http` 1.0.
        let extension = Extension(Arc::new(self));
        (status_code, extension, body).into_response()
    }
}

impl Error {
    // `anyhow::Error` prints the chain of sources if the alternate flag is
    // specified. Impls generated by `thiserror::Error` ignore the alternate
    // flag, hence the explicit chain here.
    pub fn format_sources(&self) -> impl Display + '_ {
        self.sources().format(": ")
    }

    fn sources(&self) -> impl Iterator<Item = &dyn StdError> {
        let mut error: Option<&dyn StdError> = Some(self);

        core::iter::from_fn(move || {
            let source = error?.source();
            core::mem::replace(&mut error, source)
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::AttestationNotFound | Self::SubcommitteeMessagesNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AttestationSlotNotValid
            | Self::EpochInFuture { .. }
            | Self::InvalidContributionAndProofs(_)
            | Self::InvalidEpoch(_)
            | Self::InvalidJsonBody(_)
            | Self::InvalidQuery(_)
            | Self::InvalidSlot(_)
            | Self::InvalidValidatorIndex
            | Self::NoSubscriptionsProvided
            | Self::SlotTooFarAhead { .. }
            | Self::Subscriptions(_)
            | Self::ZeroSignature
            | Self::ValidatorRegistrationEmpty => StatusCode::BAD_REQUEST,
            Self::BroadcastFailed | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HeadIsOptimistic | Self::NodeIsSyncing => StatusCode::SERVICE_UNAVAILABLE,
            Self::Duties(error) => match error {
                duties::Error::EpochAfterNext { .. }
                | duties::Error::EpochTooFarInFuture { .. }
                | duties::Error::InvalidValidatorIndex => StatusCode::BAD_REQUEST,
                duties::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BlockProducer(error) => match error {
                block_producer::Error::NoBuilderConfigured
                | block_producer::Error::NodeIsOptimistic => StatusCode::SERVICE_UNAVAILABLE,
                block_producer::Error::RegisterValidators(_) => StatusCode::BAD_REQUEST,
                block_producer::Error::PreparedBlockIsBlinded(_)
                | block_producer::Error::PreparedBlockIsNotBlinded(_)
                | block_producer::Error::TooManyBlobSidecars { .. }
                | block_producer::Error::DeadlineExceeded
                | block_producer::Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> EthErrorResponse {
        EthErrorResponse {
            code: self.status_code().as_u16(),
            message: self,
            failures: self.failures(),
        }
    }

    fn failures(&self) -> &[IndexedError] {
        match self {
            Self::InvalidContributionAndProofs(failures) => failures,
            _ => &[],
        }
    }
}

#[derive(Debug)]
pub struct IndexedError {
    pub index: usize,
    pub error: AnyhowError,
}

impl Serialize for IndexedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut indexed_error = serializer.serialize_struct("IndexedError", 2)?;
        indexed_error.serialize_field("index", &self.index)?;
        indexed_error.serialize_field("message", &format!("{:#}", self.error))?;
        indexed_error.end()
    }
}

#[derive(Serialize)]
struct EthErrorResponse<'error> {
    // The absence of string quoting is intentional.
    // The `code` field is supposed to contain a number.
    code: u16,
    message: &'error Error,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    failures: &'error [IndexedError],
}

#[allow(clippy::needless_pass_by_value)]
#[cfg(test)]
mod tests {
    use serde_json::{json, Result, Value};
    use test_case::test_case;

    use super::*;

    #[test_case(
        Error::AttestationNotFound,
        json!({
            "code": 404,
            "message": "No matching attestation found",
        })
    )]
    #[test_case(
        Error::Duties(duties::Error::EpochAfterNext { requested: 10, next: 4 }),
        json!({
            "code": 400,
            "message": "Request epoch 10 can not be greater than next epoch 4",
        })
    )]
    #[test_case(
        Error::BlockProducer(block_producer::Error::NoBuilderConfigured),
        json!({
            "code": 503,
            "message": "Block builder not configured",
        })
    )]
    #[test_case(
        Error::InvalidContributionAndProofs(vec![IndexedError {
            index: 1,
            error: anyhow::anyhow!("The subcommittee index is out of range"),
        }]),
        json!({
            "code": 400,
            "message": "invalid contribution and proofs",
            "failures": [
                {
                    "index": 1,
                    "message": "The subcommittee index is out of range",
                },
            ],
        })
    )]
    fn error_is_serialized_correctly(error: Error, expected_json: Value) -> Result<()> {
        let actual_json = serde_json::to_value(error.body())?;
        assert_eq!(actual_json, expected_json);
        Ok(())
    }
}
