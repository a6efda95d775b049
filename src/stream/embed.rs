//! Embed references handed over by the page scraper.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

/// A hosting-site URL found on a content page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedReference {
    /// Player page or wrapper URL.
    pub url: String,
    /// Usually the content page the embed was found on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Extra headers the embed fetch needs.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl EmbedReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: None,
            headers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Parsed URL, if well-formed and absolute.
    pub fn parsed(&self) -> Option<Url> {
        Url::parse(self.url.trim()).ok()
    }

    /// Lowercased host without a leading `www.`.
    pub fn host(&self) -> Option<String> {
        self.parsed().and_then(|u| u.host_str().map(normalize_host))
    }
}

impl From<&str> for EmbedReference {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for EmbedReference {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
