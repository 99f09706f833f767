use crate::domain::errors::ApiError;
use crate::domain::models::credential::Credential;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;

/// Observable state of the most recent request issued by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub in_flight: bool,
    pub last_error: Option<ApiError>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(&'static str, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn query(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is not valid UTF-8: {0}")]
    Text(#[from] std::str::Utf8Error),
}

/// How a successful response body is turned into a value.
pub trait ResponseBody: Sized {
    /// `false` skips reading the body entirely.
    const READS_BODY: bool = true;

    fn decode(body: &[u8]) -> Result<Self, DecodeError>;
}

/// Structured JSON decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> ResponseBody for Json<T> {
    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(Json(serde_json::from_slice(body)?))
    }
}

/// Raw text decode.
impl ResponseBody for String {
    fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        Ok(std::str::from_utf8(body)?.to_owned())
    }
}

/// No body.
impl ResponseBody for () {
    const READS_BODY: bool = false;

    fn decode(_body: &[u8]) -> Result<Self, DecodeError> {
        Ok(())
    }
}

/// Resets `in_flight` if the request future is dropped before completing.
struct InFlightGuard<'a>(&'a watch::Sender<RequestState>);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| {
            let was_in_flight = state.in_flight;
            state.in_flight = false;
            was_in_flight
        });
    }
}

pub struct AuthenticatedRequestClient {
    http: Client,
    base_url: String,
    credential: Option<Credential>,
    state: watch::Sender<RequestState>,
}

impl AuthenticatedRequestClient {
    pub fn new(http: Client, base_url: impl Into<String>, credential: Option<Credential>) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            state,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Issues `resource` (a path relative to the base URL) and decodes the
    /// body as `B`. Every failure is returned as a normalized [`ApiError`].
    #[tracing::instrument(
        name = "AuthenticatedRequestClient::request",
        skip(self, options),
        fields(method = %options.method)
    )]
    pub async fn request<B: ResponseBody>(
        &self,
        resource: &str,
        options: RequestOptions,
    ) -> Result<B, ApiError> {
        self.state.send_modify(|state| {
            state.in_flight = true;
            state.last_error = None;
        });
        let _guard = InFlightGuard(&self.state);

        let result = self.execute(resource, options).await;

        let last_error = result.as_ref().err().cloned();
        self.state.send_modify(|state| {
            state.in_flight = false;
            state.last_error = last_error;
        });
        result
    }

    async fn execute<B: ResponseBody>(
        &self,
        resource: &str,
        options: RequestOptions,
    ) -> Result<B, ApiError> {
        let url = self.resolve(resource, &options.query)?;
        let headers = self.authorize(options.headers)?;

        let response = self
            .http
            .request(options.method, url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request to {} failed: {}", resource, e);
                ApiError::unexpected()
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("API returned {} for {}", status, resource);
            let message = status
                .canonical_reason()
                .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string);
            return Err(ApiError::new(status.as_u16(), message));
        }

        if !B::READS_BODY {
            return B::decode(&[]).map_err(|_| ApiError::unexpected());
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read response body for {}: {}", resource, e);
            ApiError::unexpected()
        })?;

        B::decode(&body).map_err(|e| {
            tracing::warn!("Failed to decode response for {}: {}", resource, e);
            ApiError::unexpected()
        })
    }

    fn resolve(&self, resource: &str, query: &[(&'static str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, resource)).map_err(|e| {
            tracing::warn!("Invalid request URL for {}: {}", resource, e);
            ApiError::unexpected()
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Adds the bearer header unless the caller already supplied one.
    fn authorize(&self, mut headers: HeaderMap) -> Result<HeaderMap, ApiError> {
        let Some(credential) = &self.credential else {
            return Ok(headers);
        };
        if headers.contains_key(AUTHORIZATION) {
            return Ok(headers);
        }

        let mut value = HeaderValue::from_str(&credential.bearer_header_value()).map_err(|e| {
            tracing::warn!("Credential is not a valid header value: {}", e);
            ApiError::unexpected()
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}
