//! Declared video quality.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

static RESOLUTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3,4})[pP]").expect("valid resolution regex"));

/// Ordinal used for sorting and display only.
///
/// `Unknown` ranks below every known height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Quality {
    #[default]
    Unknown,
    /// Vertical resolution in pixels.
    Height(u32),
}

impl Quality {
    /// Map a site "format id" to a height.
    ///
    /// These are the itag-style codes Google-hosted players (Blogger and
    /// its clones) put next to each progressive stream.
    pub fn from_format_id(id: i64) -> Self {
        match id {
            18 => Self::Height(360),
            59 => Self::Height(480),
            22 => Self::Height(720),
            37 => Self::Height(1080),
            _ => Self::Unknown,
        }
    }

    /// First `720p`-style token in a title, URL path or label.
    pub fn from_text(text: &str) -> Self {
        RESOLUTION_TOKEN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .map_or(Self::Unknown, Self::Height)
    }

    /// Pixel height, if known.
    pub fn height(self) -> Option<u32> {
        match self {
            Self::Unknown => None,
            Self::Height(h) => Some(h),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Height(h) => write!(f, "{h}p"),
        }
    }
}

impl Serialize for Quality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown => serializer.serialize_none(),
            Self::Height(h) => serializer.serialize_u32(*h),
        }
    }
}
