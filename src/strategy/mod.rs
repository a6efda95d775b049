//! Stream strategies
//!
//! A [`Strategy`] turns one embed URL into zero or more
//! [`StreamDescriptor`]s. It may fetch as many pages as the host needs,
//! and it may hand URLs back to the dispatcher through
//! [`Resolution::delegates`] when the embed is only a wrapper around
//! another host's player.
//!
//! Strategies return errors freely. The resolver absorbs them at the
//! task boundary, so none of them carry their own catch-all handling.

mod archivd;
mod blogger;
mod direct;
mod kotakajaib;
mod kuramadrive;
mod layaranime;
mod linkbox;
mod mega;
mod qiwi;
mod racaty;
mod script_source;
mod uservideo;
mod zippyshare;

use async_trait::async_trait;
use url::Url;

use crate::error::{ResolveError, Result};
use crate::http_client::{FetchRequest, FetchResponse, HttpFetch};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, StreamDescriptor, SubtitleTrack};

pub use archivd::Archivd;
pub use blogger::Blogger;
pub use direct::Direct;
pub use kotakajaib::Kotakajaib;
pub use kuramadrive::Kuramadrive;
pub use layaranime::LayarAnime;
pub use linkbox::Linkbox;
pub use mega::Mega;
pub use qiwi::Qiwi;
pub use racaty::Racaty;
pub use script_source::ScriptSource;
pub use uservideo::Uservideo;
pub use zippyshare::ZippyShare;

/// What one strategy produced for one embed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Streams in the order the strategy discovered them.
    pub streams: Vec<StreamDescriptor>,
    pub subtitles: Vec<SubtitleTrack>,
    /// URLs that must go back through dispatch.
    pub delegates: Vec<EmbedReference>,
}

impl Resolution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_streams(streams: Vec<StreamDescriptor>) -> Self {
        Self {
            streams,
            ..Self::default()
        }
    }

    pub fn from_delegates(delegates: Vec<EmbedReference>) -> Self {
        Self {
            delegates,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.subtitles.is_empty() && self.delegates.is_empty()
    }
}

/// Per-site procedure for a hosting service.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Display name, also used as `source_name` on descriptors.
    fn name(&self) -> &'static str;

    /// Hosts or URL patterns this strategy claims.
    fn hosts(&self) -> Vec<HostPredicate>;

    /// Whether the final stream request must carry a `Referer`.
    fn requires_referer(&self) -> bool {
        true
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution>;
}

/// All built-in strategies, in registration order.
pub fn builtin() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(Archivd),
        Box::new(Blogger),
        Box::new(Uservideo),
        Box::new(Kuramadrive),
        Box::new(Linkbox),
        Box::new(Qiwi),
        Box::new(ZippyShare),
        Box::new(ScriptSource::streamwish()),
        Box::new(ScriptSource::vidguard()),
        Box::new(ScriptSource::rpmshare()),
        Box::new(ScriptSource::filemoon()),
        Box::new(Mega),
        Box::new(Racaty),
        Box::new(Kotakajaib),
        Box::new(LayarAnime),
        Box::new(Direct),
    ]
}

/// GET the embed page with the embed's own referer and headers.
pub(crate) async fn fetch_embed(http: &dyn HttpFetch, embed: &EmbedReference) -> Result<FetchResponse> {
    if embed.parsed().is_none() {
        return Err(ResolveError::InvalidUrl(embed.url.clone()));
    }
    let request = FetchRequest::get(&embed.url)
        .referer(embed.referer.as_deref())
        .headers(&embed.headers);
    http.fetch(&request).await
}

/// Resolve `href` (possibly relative or protocol-relative) against `base`.
pub(crate) fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base).ok()?.join(href).ok().map(|u| u.to_string()),
    }
}

/// `scheme://host/` of `url`.
pub(crate) fn origin_referer(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    Some(format!("{}://{}/", url.scheme(), url.host_str()?))
}
