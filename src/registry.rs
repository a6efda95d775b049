//! Strategy registry and dispatcher.
//!
//! The registry is an ordered table of (host predicate, strategy) pairs,
//! built once at startup and read-only afterwards. Lookups need no
//! locking and may run from any number of tasks at once.
//!
//! Registrations are checked in registration order. First match wins.
//! A URL nothing claims is not an error: [`Registry::dispatch`] returns
//! `None` and the resolver records the embed as skipped.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::stream::embed::normalize_host;
use crate::strategy::{self, Strategy};

/// What part of a URL a registration claims.
#[derive(Debug, Clone)]
pub enum HostPredicate {
    /// Host equals this value (`www.` ignored, case-insensitive).
    Exact(&'static str),
    /// Host equals this value or is a subdomain of it.
    Suffix(&'static str),
    /// Regex over the whole URL.
    Pattern(Regex),
}

impl HostPredicate {
    /// `host` must already be normalized (lowercase, no `www.`).
    fn matches(&self, host: &str, url: &str) -> bool {
        match self {
            Self::Exact(expected) => host == *expected,
            Self::Suffix(suffix) => {
                host == *suffix
                    || host
                        .strip_suffix(suffix)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            Self::Pattern(re) => re.is_match(url),
        }
    }
}

impl fmt::Display for HostPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(host) => write!(f, "{host}"),
            Self::Suffix(host) => write!(f, "*.{host}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// One row of the dispatch table.
pub struct Registration {
    pub predicate: HostPredicate,
    pub strategy: Arc<dyn Strategy>,
}

/// Immutable dispatch table.
pub struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    /// Registry with every built-in strategy.
    pub fn builtin() -> Self {
        Self::builder().with_builtins().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Strategy owning `url`'s host, if any.
    ///
    /// Scheme-agnostic: protocol-relative (`//host/...`) and scheme-less
    /// (`host/...`) URLs are read as https.
    pub fn dispatch(&self, url: &str) -> Option<Arc<dyn Strategy>> {
        let parsed = parse_embed_url(url)?;
        let host = normalize_host(parsed.host_str()?);
        let full = parsed.as_str();

        let found = self
            .registrations
            .iter()
            .find(|r| r.predicate.matches(&host, full))
            .map(|r| Arc::clone(&r.strategy));

        match &found {
            Some(strategy) => debug!(url, strategy = strategy.name(), "dispatched"),
            None => debug!(url, host = %host, "no strategy registered"),
        }
        found
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Strategy names in registration order, without repeats.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for r in &self.registrations {
            let name = r.strategy.name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Number of registrations (predicates, not strategies).
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Builds a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    strategies: Vec<Arc<dyn Strategy>>,
    disabled: Vec<String>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn with_builtins(mut self) -> Self {
        self.strategies
            .extend(strategy::builtin().into_iter().map(Arc::<dyn Strategy>::from));
        self
    }

    #[must_use]
    pub fn register(self, strategy: impl Strategy + 'static) -> Self {
        self.register_arc(Arc::new(strategy))
    }

    #[must_use]
    pub fn register_arc(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Leave out strategies by name (case-insensitive).
    #[must_use]
    pub fn without<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.disabled
            .extend(names.iter().map(|n| n.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn build(self) -> Registry {
        let mut registrations = Vec::new();
        for strategy in self.strategies {
            if self
                .disabled
                .contains(&strategy.name().to_ascii_lowercase())
            {
                debug!(strategy = strategy.name(), "strategy disabled");
                continue;
            }
            for predicate in strategy.hosts() {
                registrations.push(Registration {
                    predicate,
                    strategy: Arc::clone(&strategy),
                });
            }
        }
        Registry { registrations }
    }
}

pub(crate) fn parse_embed_url(url: &str) -> Option<Url> {
    let url = url.trim();
    if url.is_empty() || (url.starts_with('/') && !url.starts_with("//")) {
        return None;
    }
    if let Some(rest) = url.strip_prefix("//") {
        return Url::parse(&format!("https://{rest}")).ok();
    }
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => Some(parsed),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{url}")).ok()
        }
        Err(_) => None,
    }
}
