//! Resolution coordinator
//!
//! Fans a content page's embed list out to the registry, one future per
//! embed, and joins the results back in input order.
//!
//! - Concurrency is `buffered`, so completion order never leaks into
//!   output order.
//! - Every strategy runs behind one task boundary that turns errors and
//!   panics into "this embed contributed nothing". Only cancellation
//!   crosses it.
//! - Delegated URLs re-enter dispatch one level deeper, up to
//!   `max_depth`.
//! - Nothing is spawned. Dropping the returned future drops every
//!   in-flight fetch with it.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::http_client::{AcceleratedClient, HttpFetch};
use crate::registry::{parse_embed_url, Registry};
use crate::stream::{EmbedReference, StreamDescriptor, SubtitleTrack};
use crate::strategy::{absolutize, Strategy};

/// Why an embed contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    UnsupportedHost,
    DepthExceeded,
    /// Error or panic absorbed at the task boundary.
    Failed(String),
}

impl From<ResolveError> for SkipReason {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnsupportedHost(_) => Self::UnsupportedHost,
            ResolveError::DepthExceeded { .. } => Self::DepthExceeded,
            other => Self::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedHost => f.write_str("unsupported host"),
            Self::DepthExceeded => f.write_str("redelegation depth exceeded"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEmbed {
    pub url: String,
    pub reason: SkipReason,
}

/// Result of resolving one content page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// `false` only when the embed list itself could not be obtained.
    pub success: bool,
    /// Deduplicated by URL, in embed order.
    pub streams: Vec<StreamDescriptor>,
    pub subtitles: Vec<SubtitleTrack>,
    /// Diagnostics only.
    pub skipped: Vec<SkippedEmbed>,
}

impl ResolveOutcome {
    /// The embed list never arrived.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Everything one embed (and its delegates) produced, before dedup.
#[derive(Debug, Default)]
struct EmbedOutput {
    streams: Vec<StreamDescriptor>,
    subtitles: Vec<SubtitleTrack>,
    skipped: Vec<SkippedEmbed>,
}

impl EmbedOutput {
    fn skipped(url: &str, reason: SkipReason) -> Self {
        Self {
            skipped: vec![SkippedEmbed {
                url: url.to_string(),
                reason,
            }],
            ..Self::default()
        }
    }

    fn append(&mut self, other: Self) {
        self.streams.extend(other.streams);
        self.subtitles.extend(other.subtitles);
        self.skipped.extend(other.skipped);
    }
}

/// Resolves embed lists against a [`Registry`].
pub struct Resolver {
    registry: Arc<Registry>,
    fetcher: Arc<dyn HttpFetch>,
    max_depth: usize,
    concurrency: usize,
}

impl Resolver {
    pub fn new(registry: impl Into<Arc<Registry>>, fetcher: Arc<dyn HttpFetch>, config: &ResolverConfig) -> Self {
        Self {
            registry: registry.into(),
            fetcher,
            max_depth: config.max_depth,
            concurrency: config.concurrency(),
        }
    }

    /// Built-in registry minus `config.disabled`, over a live HTTP client.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let registry = Registry::builder()
            .with_builtins()
            .without(config.disabled.as_slice())
            .build();
        let fetcher = AcceleratedClient::from_config(config)?;
        Ok(Self::new(registry, Arc::new(fetcher), config))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve every embed found on `page_url`.
    ///
    /// Never fails: broken embeds show up in [`ResolveOutcome::skipped`].
    pub async fn resolve_all(&self, embeds: Vec<EmbedReference>, page_url: &str) -> ResolveOutcome {
        match self.run(embeds, page_url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("resolution aborted: {e}");
                ResolveOutcome {
                    success: true,
                    ..ResolveOutcome::default()
                }
            }
        }
    }

    /// [`resolve_all`](Self::resolve_all), abandoned as soon as `cancel`
    /// fires. Partial results are discarded.
    pub async fn resolve_all_until(
        &self,
        embeds: Vec<EmbedReference>,
        page_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolveOutcome> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(page = page_url, "resolution cancelled");
                Err(ResolveError::Cancelled)
            }
            outcome = self.run(embeds, page_url) => outcome,
        }
    }

    /// Resolve a single embed with no content page.
    pub async fn resolve_one(&self, embed: impl Into<EmbedReference>) -> ResolveOutcome {
        self.resolve_all(vec![embed.into()], "").await
    }

    /// Resolve an embed list produced by the page scraper.
    ///
    /// A failed listing yields `success == false` and nothing else.
    pub async fn resolve_listing<F, E>(&self, listing: F, page_url: &str) -> ResolveOutcome
    where
        F: Future<Output = std::result::Result<Vec<EmbedReference>, E>>,
        E: fmt::Display,
    {
        match listing.await {
            Ok(embeds) => self.resolve_all(embeds, page_url).await,
            Err(e) => {
                warn!(page = page_url, "embed list unavailable: {e}");
                ResolveOutcome::unavailable()
            }
        }
    }

    /// [`resolve_listing`](Self::resolve_listing), abandoned as soon as
    /// `cancel` fires, whether the listing is still loading or its embeds
    /// are resolving.
    pub async fn resolve_listing_until<F, E>(
        &self,
        listing: F,
        page_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolveOutcome>
    where
        F: Future<Output = std::result::Result<Vec<EmbedReference>, E>>,
        E: fmt::Display,
    {
        let embeds = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(page = page_url, "resolution cancelled");
                return Err(ResolveError::Cancelled);
            }
            listing = listing => match listing {
                Ok(embeds) => embeds,
                Err(e) => {
                    warn!(page = page_url, "embed list unavailable: {e}");
                    return Ok(ResolveOutcome::unavailable());
                }
            },
        };
        self.resolve_all_until(embeds, page_url, cancel).await
    }

    async fn run(&self, embeds: Vec<EmbedReference>, page_url: &str) -> Result<ResolveOutcome> {
        let page_url = page_url.trim();
        let total = embeds.len();

        let outputs: Vec<EmbedOutput> = futures::stream::iter(embeds)
            .map(|mut embed| {
                if embed.referer.is_none() && !page_url.is_empty() {
                    embed.referer = Some(page_url.to_string());
                }
                self.resolve_embed(embed, 0)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut outcome = ResolveOutcome {
            success: true,
            ..ResolveOutcome::default()
        };
        let mut seen_streams = HashSet::new();
        let mut seen_subtitles = HashSet::new();
        for output in outputs {
            for stream in output.streams {
                if seen_streams.insert(stream.stream_url.clone()) {
                    outcome.streams.push(stream);
                } else {
                    debug!(url = %stream.stream_url, "dropping duplicate stream");
                }
            }
            for track in output.subtitles {
                if seen_subtitles.insert(track.url.clone()) {
                    outcome.subtitles.push(track);
                }
            }
            outcome.skipped.extend(output.skipped);
        }

        info!(
            embeds = total,
            streams = outcome.streams.len(),
            subtitles = outcome.subtitles.len(),
            skipped = outcome.skipped.len(),
            "resolution finished"
        );
        Ok(outcome)
    }

    /// Pick the strategy for `embed`, rewriting scheme-less URLs to the
    /// absolute form dispatch matched.
    fn strategy_for(&self, embed: &mut EmbedReference, depth: usize) -> Result<Arc<dyn Strategy>> {
        if depth > self.max_depth {
            return Err(ResolveError::DepthExceeded {
                url: embed.url.clone(),
                depth,
            });
        }
        let strategy = self
            .registry
            .dispatch(&embed.url)
            .ok_or_else(|| ResolveError::UnsupportedHost(embed.url.clone()))?;
        if embed.parsed().is_none() {
            if let Some(url) = parse_embed_url(&embed.url) {
                embed.url = url.into();
            }
        }
        Ok(strategy)
    }

    /// One embed, its strategy, and any delegates it hands back.
    fn resolve_embed(&self, mut embed: EmbedReference, depth: usize) -> BoxFuture<'_, Result<EmbedOutput>> {
        async move {
            let strategy = match self.strategy_for(&mut embed, depth) {
                Ok(strategy) => strategy,
                Err(e) => {
                    debug!(url = %embed.url, depth, "skipping embed: {e}");
                    return Ok(EmbedOutput::skipped(&embed.url, e.into()));
                }
            };

            let attempt = AssertUnwindSafe(strategy.resolve(self.fetcher.as_ref(), &embed))
                .catch_unwind()
                .await;
            let resolution = match attempt {
                Ok(Ok(resolution)) => resolution,
                Ok(Err(e)) if !e.is_absorbed() => return Err(e),
                Ok(Err(e)) => {
                    warn!(url = %embed.url, strategy = strategy.name(), "strategy failed: {e}");
                    return Ok(EmbedOutput::skipped(&embed.url, e.into()));
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(url = %embed.url, strategy = strategy.name(), "strategy panicked: {message}");
                    return Ok(EmbedOutput::skipped(&embed.url, SkipReason::Failed(message)));
                }
            };

            let mut output = EmbedOutput {
                streams: normalize_streams(strategy.as_ref(), &embed, resolution.streams),
                subtitles: resolution
                    .subtitles
                    .into_iter()
                    .filter_map(|t| absolutize(&embed.url, &t.url).map(|url| SubtitleTrack::new(t.language, url)))
                    .collect(),
                skipped: Vec::new(),
            };
            if resolution.delegates.is_empty() {
                return Ok(output);
            }

            let delegated: Vec<EmbedOutput> = futures::stream::iter(resolution.delegates)
                .map(|mut delegate| {
                    if delegate.referer.is_none() {
                        delegate.referer.clone_from(&embed.referer);
                    }
                    self.resolve_embed(delegate, depth + 1)
                })
                .buffered(self.concurrency)
                .try_collect()
                .await?;
            for child in delegated {
                output.append(child);
            }
            Ok(output)
        }
        .boxed()
    }
}

/// Absolutize, drop unplayable URLs, and settle the referer.
fn normalize_streams(
    strategy: &dyn Strategy,
    embed: &EmbedReference,
    streams: Vec<StreamDescriptor>,
) -> Vec<StreamDescriptor> {
    streams
        .into_iter()
        .filter_map(|mut stream| {
            let Some(url) = absolutize(&embed.url, &stream.stream_url) else {
                debug!(strategy = strategy.name(), "dropping empty stream url");
                return None;
            };
            stream.stream_url = url;
            if !stream.is_playable() {
                debug!(url = %stream.stream_url, "dropping unplayable stream url");
                return None;
            }
            if stream.source_name.is_empty() {
                stream.source_name = strategy.name().to_string();
            }
            if !strategy.requires_referer() {
                stream.referer = None;
            } else if stream.referer.is_none() {
                stream.referer.clone_from(&embed.referer);
            }
            Some(stream)
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::registry::HostPredicate;
    use crate::strategy::Resolution;
    use crate::testing::MockFetcher;

    /// Emits the streams it was built with.
    struct Scripted {
        streams: Vec<StreamDescriptor>,
        referer: bool,
    }

    #[async_trait]
    impl Strategy for Scripted {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn hosts(&self) -> Vec<HostPredicate> {
            vec![HostPredicate::Suffix("scripted.example")]
        }

        fn requires_referer(&self) -> bool {
            self.referer
        }

        async fn resolve(&self, _http: &dyn HttpFetch, _embed: &EmbedReference) -> Result<Resolution> {
            Ok(Resolution::from_streams(self.streams.clone()))
        }
    }

    /// Delegates to itself forever.
    struct Loop;

    #[async_trait]
    impl Strategy for Loop {
        fn name(&self) -> &'static str {
            "Loop"
        }

        fn hosts(&self) -> Vec<HostPredicate> {
            vec![HostPredicate::Suffix("loop.example")]
        }

        async fn resolve(&self, _http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
            Ok(Resolution::from_delegates(vec![EmbedReference::new(format!("{}/x", embed.url))]))
        }
    }

    fn resolver_with(strategy: impl Strategy + 'static, config: &ResolverConfig) -> Resolver {
        let registry = Registry::builder().register(strategy).build();
        Resolver::new(registry, Arc::new(MockFetcher::new()), config)
    }

    #[tokio::test]
    async fn streams_are_normalized() {
        let resolver = resolver_with(
            Scripted {
                streams: vec![
                    StreamDescriptor::new("", "/v/720.mp4"),
                    StreamDescriptor::new("Named", "javascript:void(0)"),
                    StreamDescriptor::new("Named", "  "),
                ],
                referer: true,
            },
            &ResolverConfig::default(),
        );

        let outcome = resolver
            .resolve_all(
                vec![EmbedReference::new("https://scripted.example/e/1")],
                "https://page.example/ep/1",
            )
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.streams.len(), 1);
        let s = &outcome.streams[0];
        assert_eq!(s.stream_url, "https://scripted.example/v/720.mp4");
        assert_eq!(s.source_name, "Scripted");
        assert_eq!(s.referer.as_deref(), Some("https://page.example/ep/1"));
    }

    #[tokio::test]
    async fn referer_cleared_when_not_required() {
        let resolver = resolver_with(
            Scripted {
                streams: vec![StreamDescriptor::new("", "https://cdn.example/a.mp4").with_referer("https://x.example/")],
                referer: false,
            },
            &ResolverConfig::default(),
        );
        let outcome = resolver.resolve_one("https://scripted.example/e/1").await;
        assert!(outcome.streams[0].referer.is_none());
    }

    #[tokio::test]
    async fn scheme_less_embed_is_made_absolute() {
        let resolver = resolver_with(
            Scripted {
                streams: vec![StreamDescriptor::new("", "/v/720.mp4")],
                referer: false,
            },
            &ResolverConfig::default(),
        );
        let outcome = resolver.resolve_one("scripted.example/e/1").await;
        assert_eq!(outcome.streams[0].stream_url, "https://scripted.example/v/720.mp4");
    }

    #[tokio::test]
    async fn delegation_stops_at_depth_cap() {
        let config = ResolverConfig {
            max_depth: 2,
            ..ResolverConfig::default()
        };
        let resolver = resolver_with(Loop, &config);

        let outcome = tokio::time::timeout(Duration::from_secs(5), resolver.resolve_one("https://loop.example/a"))
            .await
            .expect("depth cap must terminate");
        assert!(outcome.streams.is_empty());
        assert_eq!(
            outcome.skipped,
            vec![SkippedEmbed {
                url: "https://loop.example/a/x/x/x".into(),
                reason: SkipReason::DepthExceeded,
            }]
        );
    }

    #[tokio::test]
    async fn zero_depth_never_delegates() {
        let config = ResolverConfig {
            max_depth: 0,
            ..ResolverConfig::default()
        };
        let outcome = resolver_with(Loop, &config)
            .resolve_one("https://loop.example/a")
            .await;
        assert_eq!(outcome.skipped[0].url, "https://loop.example/a/x");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "panic");
    }

    #[tokio::test]
    async fn cancelled_listing_is_never_awaited_to_completion() {
        let resolver = resolver_with(Loop, &ResolverConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = resolver
            .resolve_listing_until(
                futures::future::pending::<std::result::Result<Vec<EmbedReference>, String>>(),
                "https://page.example/",
                &cancel,
            )
            .await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }

    #[tokio::test]
    async fn listing_until_resolves_when_not_cancelled() {
        let resolver = resolver_with(Loop, &ResolverConfig::default());
        let outcome = resolver
            .resolve_listing_until(
                async { Ok::<_, String>(vec![EmbedReference::new("https://unregistered.example/e")]) },
                "https://page.example/",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.skipped[0].reason, SkipReason::UnsupportedHost);

        let outcome = resolver
            .resolve_listing_until(async { Err::<Vec<EmbedReference>, _>("503") }, "", &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn failed_listing_reports_unavailable() {
        let resolver = resolver_with(Loop, &ResolverConfig::default());
        let outcome = resolver
            .resolve_listing(async { Err::<Vec<EmbedReference>, _>("listing page 503") }, "https://page.example/")
            .await;
        assert!(!outcome.success);
        assert!(outcome.streams.is_empty());

        let outcome = resolver
            .resolve_listing(async { Ok::<_, String>(Vec::new()) }, "https://page.example/")
            .await;
        assert!(outcome.success);
    }
}
