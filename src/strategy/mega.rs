use async_trait::async_trait;

use super::{absolutize, fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::{dom, regex_url};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, MediaKind, StreamDescriptor};

const MAIN_URL: &str = "https://mega.nz";

/// Mega embeds decrypt client-side, so the best we can usually offer is
/// the inner player frame. A manifest in the page scripts wins when the
/// page has no frame.
pub struct Mega;

#[async_trait]
impl Strategy for Mega {
    fn name(&self) -> &'static str {
        "Mega"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("mega.nz")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;
        let html = page.text();
        let referer = embed.referer.clone().unwrap_or_else(|| MAIN_URL.to_string());

        if let Some(frame) = dom::select_attr(html, "iframe", "src").and_then(|src| absolutize(&page.url, &src)) {
            return Ok(Resolution::from_streams(vec![StreamDescriptor::new(self.name(), frame)
                .with_kind(MediaKind::EmbeddedIframeFallback)
                .with_referer(referer)]));
        }

        let manifest = regex_url::find_manifest(&dom::scripts_containing(html, "m3u8").join(" "));
        Ok(manifest.map_or_else(Resolution::empty, |url| {
            Resolution::from_streams(vec![StreamDescriptor::new(self.name(), url).with_referer(referer)])
        }))
    }
}
