use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, Quality, StreamDescriptor};

static MEDIA_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[^?#]+\.(m3u8|mp4|mkv|webm)([?#].*)?$").expect("valid media path regex")
});

/// Embeds that already point at a media file. Registered last, so any
/// host-specific strategy claims its own files first.
pub struct Direct;

#[async_trait]
impl Strategy for Direct {
    fn name(&self) -> &'static str {
        "Direct"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Pattern(MEDIA_PATH.clone())]
    }

    fn requires_referer(&self) -> bool {
        false
    }

    async fn resolve(&self, _http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let mut stream = StreamDescriptor::new(self.name(), embed.url.trim())
            .with_quality(Quality::from_text(&embed.url));
        for (name, value) in &embed.headers {
            stream = stream.with_header(name.clone(), value.clone());
        }
        Ok(Resolution::from_streams(vec![stream]))
    }
}
