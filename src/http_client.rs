//! HTTP client used by strategies
//!
//! Strategies never touch `reqwest` directly. They describe a GET with a
//! [`FetchRequest`] and receive a fully-buffered [`FetchResponse`] through
//! the [`HttpFetch`] trait, which keeps them testable without a network.
//!
//! Features of [`AcceleratedClient`]:
//! - Connection pooling with keep-alive, HTTP/2 when negotiated
//! - Brotli / Gzip / Deflate (auto-negotiated)
//! - Realistic browser fingerprinting
//! - Bounded per-request timeout covering headers *and* body
//! - Per-request redirect policy (follow, or surface the `Location` header)

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, COOKIE, LOCATION, REFERER};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::fingerprint::{fixed_profile, random_profile, BrowserProfile};

/// A single outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub referer: Option<String>,
    pub headers: HashMap<String, String>,
    /// Raw `Cookie` header value, e.g. propagated from a previous response.
    pub cookies: Option<String>,
    pub follow_redirects: bool,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: None,
            headers: HashMap::new(),
            cookies: None,
            follow_redirects: true,
        }
    }

    #[must_use]
    pub fn referer(mut self, referer: Option<&str>) -> Self {
        self.referer = referer.filter(|r| !r.is_empty()).map(str::to_string);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: &HashMap<String, String>) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    #[must_use]
    pub fn cookies(mut self, cookies: Option<String>) -> Self {
        self.cookies = cookies.filter(|c| !c.is_empty());
        self
    }

    #[must_use]
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// A buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final URL after any followed redirects.
    pub url: String,
    pub status: u16,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    /// `Set-Cookie` name/value pairs, in response order.
    pub cookies: Vec<(String, String)>,
    pub body: String,
}

impl FetchResponse {
    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Non-empty `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// `Set-Cookie` values folded into a `Cookie` request header.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Anything that can perform a [`FetchRequest`].
///
/// Implementations must bound every request in time and report a timeout
/// as [`ResolveError::Timeout`].
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// reqwest-backed [`HttpFetch`].
pub struct AcceleratedClient {
    following: Client,
    manual: Client,
    timeout: Duration,
}

impl AcceleratedClient {
    /// Client with default settings and a random browser profile.
    pub fn new() -> Result<Self> {
        Self::from_config(&ResolverConfig::default())
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let profile = config
            .user_agent
            .as_deref()
            .map_or_else(random_profile, fixed_profile);
        Self::with_profile(&profile, config)
    }

    pub fn with_profile(profile: &BrowserProfile, config: &ResolverConfig) -> Result<Self> {
        let headers = profile.to_headers();
        let following = Self::builder(headers.clone(), config)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let manual = Self::builder(headers, config)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            following,
            manual,
            timeout: config.fetch_timeout(),
        })
    }

    fn builder(headers: HeaderMap, config: &ResolverConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.fetch_timeout())
    }

    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.manual
        };

        let mut builder = client.get(&request.url);
        if let Some(ref referer) = request.referer {
            builder = builder.header(REFERER, referer);
        }
        if let Some(ref cookies) = request.cookies {
            builder = builder.header(COOKIE, cookies);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(FetchResponse {
            url,
            status: status.as_u16(),
            headers,
            cookies,
            body,
        })
    }
}

#[async_trait]
impl HttpFetch for AcceleratedClient {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(follow = request.follow_redirects, "fetching");
        let response = tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| ResolveError::Timeout {
                url: request.url.clone(),
                after: self.timeout,
            })??;

        debug!(status = response.status, bytes = response.body.len(), "response received");
        check_status(request, response)
    }
}

/// Non-2xx is an error, except 3xx when the caller asked to see redirects.
pub(crate) fn check_status(request: &FetchRequest, response: FetchResponse) -> Result<FetchResponse> {
    let ok = (200..300).contains(&response.status)
        || (!request.follow_redirects && response.is_redirect());
    if ok {
        Ok(response)
    } else {
        Err(ResolveError::Status {
            url: request.url.clone(),
            status: response.status,
        })
    }
}
