//! Blogger video player. Progressive MP4 variants are listed in an inline
//! `"streams":[...]` array next to their itag-style format ids.

use async_trait::async_trait;
use serde::Deserialize;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::{dom, script};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, MediaKind, Quality, StreamDescriptor};

const STREAMS_MARKER: &str = "\"streams\":[";

pub struct Blogger;

#[async_trait]
impl Strategy for Blogger {
    fn name(&self) -> &'static str {
        "Blogger"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![
            HostPredicate::Suffix("blogger.com"),
            HostPredicate::Suffix("blogspot.com"),
        ]
    }

    fn requires_referer(&self) -> bool {
        false
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;

        let streams = dom::scripts_containing(page.text(), STREAMS_MARKER)
            .iter()
            .filter_map(|body| script::slice_between(body, STREAMS_MARKER, "]"))
            .filter_map(|fragment| script::parse_lenient::<Vec<BloggerSource>>(&script::wrap_array(fragment)))
            .flatten()
            .map(|source| {
                StreamDescriptor::new(self.name(), source.play_url)
                    .with_quality(Quality::from_format_id(source.format_id))
                    .with_kind(MediaKind::ProgressiveVideo)
            })
            .collect();

        Ok(Resolution::from_streams(streams))
    }
}

#[derive(Debug, Deserialize)]
struct BloggerSource {
    play_url: String,
    #[serde(default)]
    format_id: i64,
}
