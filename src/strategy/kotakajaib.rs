//! Kotakajaib is a mirror picker. Each server entry carries its player
//! URL base64-encoded in `data-frame`; the decoded URLs go back through
//! dispatch.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::{ResolveError, Result};
use crate::http_client::HttpFetch;
use crate::pattern::dom;
use crate::registry::HostPredicate;
use crate::stream::EmbedReference;

const MAIN_URL: &str = "https://kotakajaib.me";

pub struct Kotakajaib;

fn decode_frame(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ResolveError::Decode(format!("data-frame: {e}")))?;
    String::from_utf8(bytes)
        .map(|s| s.trim().to_string())
        .map_err(|e| ResolveError::Decode(format!("data-frame: {e}")))
}

#[async_trait]
impl Strategy for Kotakajaib {
    fn name(&self) -> &'static str {
        "Kotakajaib"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("kotakajaib.me")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;

        let delegates = dom::select_attrs(page.text(), "ul#dropdown-server li a", "data-frame")
            .iter()
            .filter_map(|encoded| match decode_frame(encoded) {
                Ok(url) if !url.is_empty() => Some(url),
                Ok(_) => None,
                Err(e) => {
                    debug!("skipping server entry: {e}");
                    None
                }
            })
            .map(|url| EmbedReference::new(url).with_referer(format!("{MAIN_URL}/")))
            .collect();

        Ok(Resolution::from_delegates(delegates))
    }
}
