//! Regular-expression URL extraction.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;

static MANIFEST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s'"\\]+\.m3u8[^\s'"\\]*"#).expect("valid manifest regex")
});

/// Capture group 1 of the first match (or the whole match when the
/// pattern has no groups), trimmed. Empty captures count as no match.
pub fn first_capture(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Compiled `js_property` patterns, keyed by property name.
static PROPERTY_PATTERNS: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(Mutex::default);

/// First absolute `.m3u8` URL in `text`.
pub fn find_manifest(text: &str) -> Option<String> {
    MANIFEST_URL.find(text).map(|m| m.as_str().to_string())
}

/// Quoted string assigned to a JS property, e.g. `file: "..."` or
/// `sources: ["..."]`. Only the first element of an array is returned.
pub fn js_property(text: &str, name: &str) -> Option<String> {
    let re = {
        let mut cache = PROPERTY_PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
        match cache.get(name) {
            Some(re) => re.clone(),
            None => {
                // the key must not be the tail of a longer identifier
                let pattern = format!(
                    r#"(?:^|[^\w$]){}\s*:\s*\[?\s*["']([^"']+)["']"#,
                    regex::escape(name)
                );
                let re = Regex::new(&pattern).ok()?;
                cache.insert(name.to_string(), re.clone());
                re
            }
        }
    };
    first_capture(&re, text).map(|url| url.replace("\\/", "/"))
}
