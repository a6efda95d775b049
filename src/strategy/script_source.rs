//! Players that keep their source URL in an inline script.
//!
//! StreamWish, VidGuard, RPMShare and Filemoon all share one shape: fetch
//! the embed, find the script carrying a marker, pull one URL out of it.
//! They differ only in the marker and in how the URL is written, so one
//! configurable strategy covers all four.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::{dom, regex_url, script};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, StreamDescriptor, SubtitleTrack};

static JW_TRACKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)tracks\s*:\s*\[(.*?)\]").expect("valid tracks regex"));

/// How the stream URL is written inside the marked script.
#[derive(Debug, Clone, Copy)]
pub enum Extract {
    /// `name: "..."` or `name: ["..."]`.
    Property(&'static str),
    /// Any absolute `.m3u8` URL.
    Manifest,
}

#[derive(Debug, Clone)]
pub struct ScriptSource {
    name: &'static str,
    main_url: &'static str,
    hosts: &'static [&'static str],
    marker: &'static str,
    extract: Extract,
    /// Read jwplayer `tracks` as subtitles.
    subtitles: bool,
}

impl ScriptSource {
    pub fn streamwish() -> Self {
        Self {
            name: "StreamWish",
            main_url: "https://streamwish.com",
            hosts: &["streamwish.com", "streamwish.to"],
            marker: "sources:",
            extract: Extract::Property("file"),
            subtitles: true,
        }
    }

    pub fn vidguard() -> Self {
        Self {
            name: "VidGuard",
            main_url: "https://vidguard.to",
            hosts: &["vidguard.to"],
            marker: "player.on",
            extract: Extract::Property("sources"),
            subtitles: false,
        }
    }

    pub fn rpmshare() -> Self {
        Self {
            name: "RPMShare",
            main_url: "https://rpmshare.xyz",
            hosts: &["rpmshare.xyz"],
            marker: "sources:",
            extract: Extract::Property("sources"),
            subtitles: false,
        }
    }

    pub fn filemoon() -> Self {
        Self {
            name: "Filemoon",
            main_url: "https://filemoon.in",
            hosts: &["filemoon.in", "filemoon.sx"],
            marker: "m3u8",
            extract: Extract::Manifest,
            subtitles: false,
        }
    }

    fn extract(&self, body: &str) -> Option<String> {
        match self.extract {
            Extract::Property(name) => regex_url::js_property(body, name),
            Extract::Manifest => regex_url::find_manifest(body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwTrack {
    file: String,
    label: Option<String>,
    kind: Option<String>,
}

fn jw_subtitles(body: &str) -> Vec<SubtitleTrack> {
    regex_url::first_capture(&JW_TRACKS, body)
        .and_then(|inner| script::parse_lenient::<Vec<JwTrack>>(&script::wrap_array(&inner)))
        .unwrap_or_default()
        .into_iter()
        .filter(|t| {
            t.kind
                .as_deref()
                .is_none_or(|k| k.eq_ignore_ascii_case("captions") || k.eq_ignore_ascii_case("subtitles"))
        })
        .map(|t| SubtitleTrack::new(t.label.unwrap_or_else(|| "Unknown".into()), t.file))
        .collect()
}

#[async_trait]
impl Strategy for ScriptSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        self.hosts.iter().copied().map(HostPredicate::Suffix).collect()
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;
        let scripts = dom::scripts_containing(page.text(), self.marker);

        let Some((body, url)) = scripts
            .iter()
            .find_map(|body| self.extract(body).map(|url| (body, url)))
        else {
            return Ok(Resolution::empty());
        };

        let referer = embed
            .referer
            .clone()
            .unwrap_or_else(|| format!("{}/", self.main_url));

        Ok(Resolution {
            streams: vec![StreamDescriptor::new(self.name, url).with_referer(referer)],
            subtitles: if self.subtitles {
                jw_subtitles(body)
            } else {
                Vec::new()
            },
            delegates: Vec::new(),
        })
    }
}
