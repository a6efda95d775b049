//! Kuramadrive: a Laravel app. The download link comes from an XHR route
//! guarded by the page's CSRF token and session cookies.

use async_trait::async_trait;
use serde::Deserialize;

use super::{absolutize, fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::{FetchRequest, HttpFetch};
use crate::pattern::dom;
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, Quality, StreamDescriptor};

const MAIN_URL: &str = "https://kuramadrive.com";

pub struct Kuramadrive;

#[derive(Debug, Deserialize)]
struct RouteReply {
    url: Option<String>,
}

#[async_trait]
impl Strategy for Kuramadrive {
    fn name(&self) -> &'static str {
        "Kuramadrive"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("kuramadrive.com")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;
        let html = page.text();

        let title = dom::select_text(html, "title").unwrap_or_default();
        let csrf = dom::select_attr(html, "meta[name=csrf-token]", "content");
        let route = dom::select_attr(html, "input#routeCheckAvl", "value")
            .and_then(|r| absolutize(&page.url, &r));

        let (Some(csrf), Some(route)) = (csrf, route) else {
            return Ok(Resolution::empty());
        };

        let request = FetchRequest::get(route)
            .referer(Some(&embed.url))
            .header("X-Requested-With", "XMLHttpRequest")
            .header("X-CSRF-TOKEN", csrf)
            .cookies(page.cookie_header());
        let reply: RouteReply = http.fetch(&request).await?.json()?;

        Ok(reply
            .url
            .filter(|u| !u.trim().is_empty())
            .map_or_else(Resolution::empty, |url| {
                Resolution::from_streams(vec![StreamDescriptor::new(self.name(), url)
                    .with_quality(Quality::from_text(&title))
                    .with_referer(format!("{MAIN_URL}/"))])
            }))
    }
}
