use anyhow::Result;
use axum::{
    http::{header::ACCEPT, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use mediatype::{MediaType, MediaTypeList};
use mime::APPLICATION_OCTET_STREAM;
use serde::Serialize;
use ssz::Encode;
use tap::Pipe as _;
use types::{nonstandard::Phase, phase0::primitives::H256};

use crate::{error::Error, misc::ETH_CONSENSUS_VERSION};

pub struct AlwaysJson;

pub enum JsonOrSsz {
    Json,
    Ssz,
}

#[derive(Serialize)]
pub struct EthResponse<T, F = AlwaysJson> {
    data: T,

    // Returned in both a JSON body field and a header.
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Phase>,

    // Returned only in JSON body fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    dependent_root: Option<H256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_optimistic: Option<bool>,

    #[serde(skip)]
    format: F,
}

impl<T: Serialize> IntoResponse for EthResponse<T, AlwaysJson> {
    fn into_response(self) -> Response {
        let run = || {
            let response_headers = self.response_headers()?;
            let response_body = self.into_json();
            Ok((response_headers, response_body))
        };

        run().map_err(Error::Internal).into_response()
    }
}

impl<T: Encode + Serialize> IntoResponse for EthResponse<T, JsonOrSsz> {
    fn into_response(self) -> Response {
        let run = || {
            let response_headers = self.response_headers()?;

            let response_body = match self.format {
                JsonOrSsz::Json => self.into_json().into_response(),
                JsonOrSsz::Ssz => self.data.as_ssz_bytes().into_response(),
            };

            Ok((response_headers, response_body))
        };

        run().map_err(Error::Internal).into_response()
    }
}

impl<T, F> EthResponse<T, F> {
    const fn new(data: T, format: F) -> Self {
        Self {
            data,
            version: None,
            dependent_root: None,
            execution_optimistic: None,
            format,
        }
    }

    #[must_use]
    pub const fn version(mut self, phase: Phase) -> Self {
        self.version = Some(phase);
        self
    }

    #[must_use]
    pub const fn dependent_root(mut self, dependent_root: H256) -> Self {
        self.dependent_root = Some(dependent_root);
        self
    }

    #[must_use]
    pub const fn execution_optimistic(mut self, execution_optimistic: bool) -> Self {
        self.execution_optimistic = Some(execution_optimistic);
        self
    }

    fn response_headers(&self) -> Result<HeaderMap> {
        let mut response_headers = HeaderMap::new();

        if let Some(phase) = self.version {
            let header_value = phase.as_ref().try_into()?;
            response_headers.insert(ETH_CONSENSUS_VERSION, header_value);
        }

        Ok(response_headers)
    }

    fn into_json(self) -> Json<EthResponse<T, AlwaysJson>> {
        let Self {
            data,
            version,
            dependent_root,
            execution_optimistic,
            format: _,
        } = self;

        let response_body = EthResponse {
            data,
            version,
            dependent_root,
            execution_optimistic,
            format: AlwaysJson,
        };

        Json(response_body)
    }
}

impl<T> EthResponse<T, AlwaysJson> {
    pub const fn json(data: T) -> Self {
        Self::new(data, AlwaysJson)
    }
}

impl<T> EthResponse<T, JsonOrSsz> {
    // `axum` recommends using a typed header instead of extracting all
    // headers, but no crate in the stack provides a type for `Accept`.
    pub fn json_or_ssz(data: T, request_headers: &HeaderMap) -> Result<Self> {
        if let Some(accept_header) = request_headers.get(ACCEPT) {
            if let Some(accept) = accept_content_type(accept_header.to_str()?)? {
                if accept == APPLICATION_OCTET_STREAM.as_ref() {
                    return Ok(Self::new(data, JsonOrSsz::Ssz));
                }
            }
        }

        Ok(Self::new(data, JsonOrSsz::Json))
    }
}

fn accept_content_type(accept_header: &str) -> Result<Option<String>> {
    let mut scored_types = vec![];

    for media_type in MediaTypeList::new(accept_header) {
        let MediaType {
            ty, subty, params, ..
        } = media_type?;

        let essence = format!("{ty}/{subty}");
        let q = params
            .iter()
            .find(|(name, _)| name == "q")
            .map(|(_, value)| value.as_str());

        scored_types.push((q, essence));
    }

    scored_types.sort_by_key(|scored_type| scored_type.0);

    scored_types
        .last()
        .map(|(_, essence)| essence)
        .cloned()
        .pipe(Ok)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use block_producer::ProducedBeaconBlock;
    use types::bellatrix::containers::BeaconBlock as BellatrixBeaconBlock;

    use super::*;

    #[test]
    fn test_accept_content_type() -> Result<()> {
        assert_eq!(
            accept_content_type("application/octet-stream;q=1,application/json;q=0.9")?,
            Some("application/octet-stream".to_owned()),
        );

        assert_eq!(
            accept_content_type("application/octet-stream;q=0.9,application/json;q=1")?,
            Some("application/json".to_owned()),
        );

        assert_eq!(
            accept_content_type("application/octet-stream")?,
            Some("application/octet-stream".to_owned()),
        );

        assert_eq!(accept_content_type("")?, None);

        Ok(())
    }

    #[tokio::test]
    async fn ssz_response_bytes_match_the_object_form() -> Result<()> {
        let block = ProducedBeaconBlock::Bellatrix(BellatrixBeaconBlock::default());
        let expected_bytes = block.as_ssz_bytes();

        let mut request_headers = HeaderMap::new();
        request_headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

        let response = EthResponse::json_or_ssz(block, &request_headers)?
            .version(Phase::Bellatrix)
            .into_response();

        assert_eq!(
            response.headers().get(ETH_CONSENSUS_VERSION),
            Some(&HeaderValue::from_static("bellatrix")),
        );

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("the response body is in memory");

        assert_eq!(body_bytes.as_ref(), expected_bytes.as_slice());

        Ok(())
    }
}
