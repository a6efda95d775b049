use async_trait::async_trait;

use super::{absolutize, fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::dom;
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, StreamDescriptor};

/// zippysha.re download pages: the file link is `a#download-url`.
pub struct ZippyShare;

#[async_trait]
impl Strategy for ZippyShare {
    fn name(&self) -> &'static str {
        "ZippyShare"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("zippysha.re")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;
        let link = dom::select_attr(page.text(), "a#download-url", "href")
            .and_then(|href| absolutize(&page.url, &href));

        Ok(link.map_or_else(Resolution::empty, |url| {
            Resolution::from_streams(vec![StreamDescriptor::new(self.name(), url)])
        }))
    }
}
