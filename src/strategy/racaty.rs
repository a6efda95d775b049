//! Racaty short links. The embed answers with a redirect straight to the
//! file, sometimes after one or two same-host hops that hand out session
//! cookies the final host also checks.

use async_trait::async_trait;
use tracing::debug;

use super::{origin_referer, Resolution, Strategy};
use crate::error::{ResolveError, Result};
use crate::http_client::{FetchRequest, HttpFetch};
use crate::pattern::redirect::{self, Hop};
use crate::registry::HostPredicate;
use crate::stream::embed::normalize_host;
use crate::stream::{EmbedReference, StreamDescriptor};

const HOST: &str = "racaty.io";
const MAX_HOPS: usize = 3;

pub struct Racaty;

fn is_own_host(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(normalize_host))
        .is_some_and(|h| h == HOST || h.ends_with(".racaty.io"))
}

fn merge_cookies(jar: Option<String>, fresh: Option<String>) -> Option<String> {
    match (jar, fresh) {
        (Some(a), Some(b)) => Some(format!("{a}; {b}")),
        (a, b) => a.or(b),
    }
}

#[async_trait]
impl Strategy for Racaty {
    fn name(&self) -> &'static str {
        "Racaty"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix(HOST)]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let first = FetchRequest::get(&embed.url)
            .referer(embed.referer.as_deref())
            .headers(&embed.headers);
        let Some(Hop { mut location, cookies }) = redirect::location(http, first).await? else {
            debug!(url = %embed.url, "racaty answered without a redirect");
            return Ok(Resolution::empty());
        };

        let mut jar = cookies;
        let mut hops = 1;
        while is_own_host(&location) && hops < MAX_HOPS {
            let request = FetchRequest::get(&location)
                .referer(Some(&embed.url))
                .cookies(jar.clone());
            let Some(hop) = redirect::location(http, request).await? else {
                return Err(ResolveError::MissingRedirect(location));
            };
            jar = merge_cookies(jar, hop.cookies);
            location = hop.location;
            hops += 1;
        }

        let mut stream = StreamDescriptor::new(self.name(), location);
        if let Some(referer) = origin_referer(&embed.url) {
            stream = stream.with_referer(referer);
        }
        if let Some(cookies) = jar {
            stream = stream.with_header("Cookie", cookies);
        }
        Ok(Resolution::from_streams(vec![stream]))
    }
}
