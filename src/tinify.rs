//! Client for the Tinify compression API.
//!
//! Shrinking is a two-hop protocol: `POST /shrink` answers `201 Created`
//! with a `Location` pointing at the compressed artifact, and a second
//! `POST` to that location asks for a resized rendition of it.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HOST, LOCATION};
use reqwest::{redirect, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{
    API_ENDPOINT, API_HOST, API_USERNAME, CONNECT_TIMEOUT, REQUEST_TIMEOUT, RESIZE_METHOD,
    RESIZE_WIDTH,
};
use crate::error::OptimizerError;

/// Locator of a compressed artifact held by the remote service. Valid for
/// the one resize call that follows the compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReference(Url);

impl ResultReference {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    async fn compress(&self, image: Bytes) -> Result<ResultReference, OptimizerError>;

    async fn resize(&self, reference: ResultReference) -> Result<Bytes, OptimizerError>;
}

/// Informational part of the `/shrink` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShrinkSummary {
    input: ShrinkInput,
    output: ShrinkOutput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShrinkInput {
    size: u64,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShrinkOutput {
    size: u64,
    #[serde(rename = "type")]
    kind: Option<String>,
    ratio: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ResizeBody {
    resize: ResizeOptions,
}

#[derive(Debug, Serialize)]
struct ResizeOptions {
    method: &'static str,
    width: u32,
}

impl ResizeBody {
    fn policy() -> Self {
        Self {
            resize: ResizeOptions {
                method: RESIZE_METHOD,
                width: RESIZE_WIDTH,
            },
        }
    }
}

pub struct TinifyClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: Url,
}

impl TinifyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, OptimizerError> {
        Self::with_endpoint(api_key, API_ENDPOINT)
    }

    /// Point the client at another base URL. The `Host` header is still
    /// pinned to [`API_HOST`].
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self, OptimizerError> {
        Self::with_timeouts(api_key, endpoint, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// `request_timeout` bounds a whole call, from connect until the body
    /// has been read.
    pub fn with_timeouts(
        api_key: impl Into<String>,
        endpoint: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, OptimizerError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| OptimizerError::InvalidEndpoint(endpoint.to_owned()))?;

        // Redirects stay unfollowed so the shrink Location is observable.
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(OptimizerError::HttpClient)?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint,
        })
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.http
            .post(url)
            .header(HOST, API_HOST)
            .basic_auth(API_USERNAME, Some(&self.api_key))
    }

    fn shrink_url(&self) -> Result<Url, OptimizerError> {
        self.endpoint
            .join("/shrink")
            .map_err(|_| OptimizerError::InvalidEndpoint(self.endpoint.to_string()))
    }

    fn resolve_location(&self, headers: &HeaderMap) -> Result<ResultReference, OptimizerError> {
        let location = headers
            .get(LOCATION)
            .ok_or(OptimizerError::MissingLocation)?
            .to_str()
            .map_err(|_| OptimizerError::InvalidLocation("<non-ascii>".to_owned()))?;

        if location.trim().is_empty() {
            return Err(OptimizerError::MissingLocation);
        }

        self.endpoint
            .join(location)
            .map(ResultReference::new)
            .map_err(|_| OptimizerError::InvalidLocation(location.to_owned()))
    }
}

#[async_trait]
impl ImageOptimizer for TinifyClient {
    async fn compress(&self, image: Bytes) -> Result<ResultReference, OptimizerError> {
        info!(size = image.len(), "sending compression request");

        let response = self
            .post(self.shrink_url()?)
            .body(image)
            .send()
            .await
            .map_err(OptimizerError::CompressionRequest)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(OptimizerError::Compression { status });
        }

        let reference = self.resolve_location(response.headers());

        match response.bytes().await {
            Ok(body) => log_shrink_summary(&body),
            Err(err) => debug!(error = %err, "failed to read compression response body"),
        }

        let reference = reference?;
        debug!(
            location = reference.as_str(),
            "compressed image stored remotely"
        );

        Ok(reference)
    }

    async fn resize(&self, reference: ResultReference) -> Result<Bytes, OptimizerError> {
        info!(location = reference.as_str(), "sending resize request");

        let response = self
            .post(reference.into_url())
            .json(&ResizeBody::policy())
            .send()
            .await
            .map_err(OptimizerError::ResizeRequest)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OptimizerError::Resize { status });
        }

        let headers = response.headers();
        info!(
            width = header_str(headers, "Image-Width"),
            height = header_str(headers, "Image-Height"),
            "compressed image resized"
        );

        response
            .bytes()
            .await
            .map_err(OptimizerError::ResizeRequest)
    }
}

fn log_shrink_summary(body: &[u8]) {
    match serde_json::from_slice::<ShrinkSummary>(body) {
        Ok(summary) => info!(
            input_size = summary.input.size,
            input_type = summary.input.kind.as_deref(),
            output_size = summary.output.size,
            output_type = summary.output.kind.as_deref(),
            ratio = summary.output.ratio,
            "image compressed"
        ),
        Err(err) => debug!(error = %err, "compression response body is not a shrink summary"),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client() -> TinifyClient {
        TinifyClient::with_endpoint("key", "https://api.tinify.com").unwrap()
    }

    #[test]
    fn resize_body_matches_the_api_shape() {
        let body = serde_json::to_value(ResizeBody::policy()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"resize": {"method": "scale", "width": 640}})
        );
    }

    #[test]
    fn shrink_summary_tolerates_partial_bodies() {
        let summary: ShrinkSummary =
            serde_json::from_str(r#"{"input":{"size":500000,"type":"image/jpeg"}}"#).unwrap();
        assert_eq!(summary.input.size, 500_000);
        assert_eq!(summary.input.kind.as_deref(), Some("image/jpeg"));
        assert_eq!(summary.output.size, 0);
    }

    #[test]
    fn absolute_location_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LOCATION,
            HeaderValue::from_static("https://api.tinify.com/output/abc123"),
        );

        let reference = client().resolve_location(&headers).unwrap();
        assert_eq!(reference.as_str(), "https://api.tinify.com/output/abc123");
    }

    #[test]
    fn relative_location_resolves_against_endpoint() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/output/abc123"));

        let reference = client().resolve_location(&headers).unwrap();
        assert_eq!(reference.as_str(), "https://api.tinify.com/output/abc123");
    }

    #[test]
    fn empty_location_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static(""));

        let err = client().resolve_location(&headers).unwrap_err();
        assert!(matches!(err, OptimizerError::MissingLocation));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = TinifyClient::with_endpoint("key", "not a url")
            .err()
            .unwrap();
        assert!(matches!(err, OptimizerError::InvalidEndpoint(_)));
    }
}
