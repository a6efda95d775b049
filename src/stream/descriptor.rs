//! Resolved stream descriptors and subtitle tracks.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use super::Quality;

/// How the playback layer should treat a stream URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    /// A single progressive file (mp4, mkv, webm).
    ProgressiveVideo,
    /// An HLS playlist.
    HlsPlaylist,
    /// A player page the host would not unwrap; play it in an iframe.
    EmbeddedIframeFallback,
}

impl MediaKind {
    /// Guess from the URL path: `.m3u8` is HLS, everything else progressive.
    pub fn infer(url: &str) -> Self {
        let path = Url::parse(url)
            .map(|u| u.path().to_ascii_lowercase())
            .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase());
        if path.ends_with(".m3u8") || path.contains(".m3u8/") {
            Self::HlsPlaylist
        } else {
            Self::ProgressiveVideo
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProgressiveVideo => "progressive",
            Self::HlsPlaylist => "hls",
            Self::EmbeddedIframeFallback => "iframe",
        }
    }
}

/// A directly playable stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    /// Strategy that produced it. Not an identity key.
    pub source_name: String,
    /// Absolute media or manifest URL.
    pub stream_url: String,
    /// `Referer` the player must send, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra_headers: HashMap<String, String>,
    pub quality: Quality,
    pub media_kind: MediaKind,
}

impl StreamDescriptor {
    /// Descriptor with inferred kind and unknown quality.
    pub fn new(source_name: impl Into<String>, stream_url: impl Into<String>) -> Self {
        let stream_url = stream_url.into().trim().to_string();
        Self {
            source_name: source_name.into(),
            media_kind: MediaKind::infer(&stream_url),
            stream_url,
            referer: None,
            extra_headers: HashMap::new(),
            quality: Quality::Unknown,
        }
    }

    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.media_kind = kind;
        self
    }

    /// Non-empty and absolute (`http`/`https`).
    pub fn is_playable(&self) -> bool {
        Url::parse(&self.stream_url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false)
    }
}

/// Subtitle track discovered while resolving a content page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubtitleTrack {
    pub language: String,
    pub url: String,
}

impl SubtitleTrack {
    pub fn new(language: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_inferred_from_path() {
        assert_eq!(
            MediaKind::infer("https://cdn.example/hls/master.m3u8?token=1"),
            MediaKind::HlsPlaylist
        );
        assert_eq!(
            MediaKind::infer("https://cdn.example/v/video.mp4"),
            MediaKind::ProgressiveVideo
        );
        assert_eq!(
            MediaKind::infer("https://cdn.example/videoplayback?id=m3u8"),
            MediaKind::ProgressiveVideo
        );
    }

    #[test]
    fn playable_requires_absolute_http_url() {
        assert!(StreamDescriptor::new("t", "https://x/video.m3u8").is_playable());
        assert!(!StreamDescriptor::new("t", "").is_playable());
        assert!(!StreamDescriptor::new("t", "   ").is_playable());
        assert!(!StreamDescriptor::new("t", "/relative/video.mp4").is_playable());
        assert!(!StreamDescriptor::new("t", "javascript:void(0)").is_playable());
    }

    #[test]
    fn builder_sets_fields() {
        let d = StreamDescriptor::new("Qiwi", "https://qiwi.gg/dl/a.mp4")
            .with_quality(Quality::Height(1080))
            .with_referer("https://qiwi.gg/")
            .with_header("Range", "bytes=0-");
        assert_eq!(d.quality, Quality::Height(1080));
        assert_eq!(d.referer.as_deref(), Some("https://qiwi.gg/"));
        assert_eq!(d.extra_headers.get("Range").map(String::as_str), Some("bytes=0-"));
        assert_eq!(d.media_kind, MediaKind::ProgressiveVideo);
    }

    #[test]
    fn serializes_kind_in_kebab_case() {
        let d = StreamDescriptor::new("Mega", "https://mega.nz/embed/x")
            .with_kind(MediaKind::EmbeddedIframeFallback);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["media_kind"], "embedded-iframe-fallback");
        assert!(json["quality"].is_null());
    }
}
