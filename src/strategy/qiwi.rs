use async_trait::async_trait;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::dom;
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, Quality, StreamDescriptor};

const MAIN_URL: &str = "https://qiwi.gg";

/// Qiwi file pages carry a plain `<video><source>` element. The CDN only
/// serves ranged requests.
pub struct Qiwi;

#[async_trait]
impl Strategy for Qiwi {
    fn name(&self) -> &'static str {
        "Qiwi"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("qiwi.gg")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;
        let html = page.text();

        let Some(source) = dom::select_attr(html, "video source", "src") else {
            return Ok(Resolution::empty());
        };
        let title = dom::select_text(html, "title").unwrap_or_default();

        Ok(Resolution::from_streams(vec![StreamDescriptor::new(self.name(), source)
            .with_quality(Quality::from_text(&title))
            .with_header("Range", "bytes=0-")
            .with_referer(format!("{MAIN_URL}/"))]))
    }
}
