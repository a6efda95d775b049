//! Uservideo: the landing page frames a Blogger-style player whose
//! `VIDEO_CONFIG` assignment lists the progressive variants.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::{absolutize, fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::{FetchRequest, HttpFetch};
use crate::pattern::{dom, regex_url, script};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, MediaKind, Quality, StreamDescriptor};

const PLAYER_REFERER: &str = "https://new.uservideo.xyz/";

static VIDEO_CONFIG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VIDEO_CONFIG\s?=\s?(.*)").expect("valid VIDEO_CONFIG regex"));

pub struct Uservideo;

#[derive(Debug, Deserialize)]
struct VideoConfig {
    #[serde(default)]
    streams: Vec<ConfigStream>,
}

#[derive(Debug, Deserialize)]
struct ConfigStream {
    play_url: String,
    #[serde(default)]
    format_id: i64,
}

#[async_trait]
impl Strategy for Uservideo {
    fn name(&self) -> &'static str {
        "Uservideo"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("uservideo.xyz")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let landing = fetch_embed(http, embed).await?;
        let Some(frame) = dom::select_attr(landing.text(), "iframe#videoFrame", "src")
            .and_then(|src| absolutize(&landing.url, &src))
        else {
            return Ok(Resolution::empty());
        };

        let player = http
            .fetch(&FetchRequest::get(frame).referer(Some(PLAYER_REFERER)))
            .await?;

        let config = regex_url::first_capture(&VIDEO_CONFIG, player.text())
            .map(|raw| raw.trim_end_matches(';').to_string())
            .and_then(|raw| script::parse_lenient::<VideoConfig>(&raw));

        let streams = config
            .map(|c| c.streams)
            .unwrap_or_default()
            .into_iter()
            .map(|s| {
                StreamDescriptor::new(self.name(), s.play_url)
                    .with_quality(Quality::from_format_id(s.format_id))
                    .with_kind(MediaKind::ProgressiveVideo)
                    .with_referer(PLAYER_REFERER)
            })
            .collect();

        Ok(Resolution::from_streams(streams))
    }
}
