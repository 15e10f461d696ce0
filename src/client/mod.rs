//! Async client for the SendGrid v3 REST API.
//!
//! One typed request/response pair per endpoint, grouped by API area. Every
//! call performs exactly one HTTP request; retrying on rate limiting is the
//! caller's job (see [`crate::retry`]).

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

pub mod api_keys;
pub mod error;
pub mod senders;
pub mod settings;
pub mod subusers;
pub mod teammates;
pub mod templates;
pub mod unsubscribe_groups;
pub mod webhooks;
pub mod whitelabel;

pub use error::ApiError;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com/v3";

/// Header that makes the parent account act on behalf of a subuser.
pub const SUBUSER_HEADER: &str = "on-behalf-of";

const USER_AGENT: &str = concat!("sendgrid-provider/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A request path relative to the API root.
///
/// Fixed parts are split on `/`. A parameter is always exactly one segment
/// and is percent-encoded when the URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint(Vec<String>);

impl Endpoint {
    pub(crate) fn new(fixed: &str) -> Self {
        Self(Vec::new()).join(fixed)
    }

    pub(crate) fn join(mut self, fixed: &str) -> Self {
        self.0.extend(
            fixed
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub(crate) fn param(mut self, value: impl ToString) -> Self {
        self.0.push(value.to_string());
        self
    }
}

impl From<&str> for Endpoint {
    fn from(fixed: &str) -> Self {
        Self::new(fixed)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// SendGrid API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SendgridClient {
    base_url: String,
    root: Url,
    subuser: Option<String>,
    http: Client,
}

impl SendgridClient {
    /// Create a client authenticating with `api_key`.
    ///
    /// `subuser` selects the account to act on behalf of; `base_url`
    /// overrides [`DEFAULT_BASE_URL`].
    pub fn new(
        api_key: &str,
        subuser: Option<String>,
        base_url: Option<&str>,
    ) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ApiError::Config(format!("API key is not a valid header value: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let root = Url::parse(&base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL {}: {}", base_url, e)))?;
        if root.cannot_be_a_base() {
            return Err(ApiError::Config(format!("invalid base URL {}", base_url)));
        }

        Ok(Self {
            base_url,
            root,
            subuser: subuser.filter(|s| !s.is_empty()),
            http,
        })
    }

    /// The API root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The subuser requests act on behalf of, if any.
    pub fn subuser(&self) -> Option<&str> {
        self.subuser.as_deref()
    }

    /// Full URL of `endpoint`, keeping any path prefix of the base URL.
    fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&endpoint.0);
        }
        url
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> RequestBuilder {
        let builder = self.http.request(method, self.url(endpoint));
        match &self.subuser {
            Some(subuser) => builder.header(SUBUSER_HEADER, subuser),
            None => builder,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: impl Into<Endpoint>,
    ) -> Result<T, ApiError> {
        let path = path.into();
        self.execute(Method::GET, &path, self.request(Method::GET, &path))
            .await
    }

    pub(crate) async fn get_query<T, Q>(
        &self,
        path: impl Into<Endpoint>,
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let path = path.into();
        self.execute(
            Method::GET,
            &path,
            self.request(Method::GET, &path).query(query),
        )
        .await
    }

    pub(crate) async fn send<T, B>(
        &self,
        method: Method,
        path: impl Into<Endpoint>,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let path = path.into();
        let builder = self.request(method.clone(), &path).json(body);
        self.execute(method, &path, builder).await
    }

    /// Send a body and ignore whatever comes back.
    pub(crate) async fn send_discard<B>(
        &self,
        method: Method,
        path: impl Into<Endpoint>,
        body: &B,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send::<IgnoredAny, B>(method, path, body).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: impl Into<Endpoint>) -> Result<(), ApiError> {
        let path = path.into();
        self.execute::<IgnoredAny>(Method::DELETE, &path, self.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &Endpoint,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        debug!(%method, %path, "SendGrid request");
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                debug!(%method, %path, "SendGrid rate limited the request");
            } else {
                warn!(%method, %path, status = status.as_u16(), "SendGrid request failed");
            }
            return Err(ApiError::from_response(status, &headers, &body));
        }

        debug!(%method, %path, status = status.as_u16(), "SendGrid request completed");
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body)
            .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, path, e)))
    }
}
