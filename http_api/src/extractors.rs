//! Custom extractors for the [Eth Beacon Node API].
//!
//! The extractors provided by `axum` report errors in plain text with various
//! status codes. The [Eth Beacon Node API] requires errors to be reported in
//! JSON with the 400 status code.
//!
//! [Eth Beacon Node API]: https://ethereum.github.io/beacon-APIs/

use anyhow::Error as AnyhowError;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json, RequestExt as _, RequestPartsExt as _,
};
use axum_extra::extract::Query;
use block_producer::ProposerData;
use serde::{de::DeserializeOwned, Deserialize};
use serde_with::{As, DisplayFromStr};
use subnet_service::{BeaconCommitteeSubscription, SyncCommitteeSubscription};
use types::{
    altair::containers::SignedContributionAndProof,
    bellatrix::containers::SignedValidatorRegistrationV1,
    phase0::{
        containers::SignedAggregateAndProof,
        primitives::{Epoch, Slot, ValidatorIndex},
    },
};

use crate::error::Error;

// This has multiple `FromRequestParts` impls to make error messages more
// specific. They all use `FromStr`, whereas the one for `Path` uses
// `DeserializeOwned`.
pub struct EthPath<T>(pub T);

impl<S: Sync> FromRequestParts<S> for EthPath<Epoch> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extract::<Path<String>>()
            .await
            .map_err(AnyhowError::new)?
            .parse()
            .map(Self)
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidEpoch)
    }
}

impl<S: Sync> FromRequestParts<S> for EthPath<Slot> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extract::<Path<String>>()
            .await
            .map_err(AnyhowError::new)?
            .parse()
            .map(Self)
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidSlot)
    }
}

pub struct EthQuery<T>(pub T);

impl<S: Sync, T: DeserializeOwned + 'static> FromRequestParts<S> for EthQuery<T> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extract::<Query<T>>()
            .await
            .map(|Query(query)| Self(query))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidQuery)
    }
}

// This has multiple `FromRequest` impls to make error messages more specific.
pub struct EthJson<T>(pub T);

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<ValidatorIndex>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "As::<Vec<DisplayFromStr>>")] Vec<ValidatorIndex>);

        request
            .extract::<Json<Wrapper>, _>()
            .await
            .map(|Json(Wrapper(indices))| Self(indices))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<BeaconCommitteeSubscription>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<BeaconCommitteeSubscription>>, _>()
            .await
            .map(|Json(subscriptions)| Self(subscriptions))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<SyncCommitteeSubscription>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<SyncCommitteeSubscription>>, _>()
            .await
            .map(|Json(subscriptions)| Self(subscriptions))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<Box<SignedAggregateAndProof>>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<Box<SignedAggregateAndProof>>>, _>()
            .await
            .map(|Json(aggregates_and_proofs)| Self(aggregates_and_proofs))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<SignedContributionAndProof>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<SignedContributionAndProof>>, _>()
            .await
            .map(|Json(contributions_and_proofs)| Self(contributions_and_proofs))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<ProposerData>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<ProposerData>>, _>()
            .await
            .map(|Json(proposer_data)| Self(proposer_data))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}

impl<S: Send + Sync> FromRequest<S> for EthJson<Vec<SignedValidatorRegistrationV1>> {
    type Rejection = Error;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        request
            .extract::<Json<Vec<SignedValidatorRegistrationV1>>, _>()
            .await
            .map(|Json(registrations)| Self(registrations))
            .map_err(AnyhowError::new)
            .map_err(Error::InvalidJsonBody)
    }
}
