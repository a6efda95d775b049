//! Redirect-location extraction.

use url::Url;

use crate::error::Result;
use crate::http_client::{FetchRequest, HttpFetch};

/// One redirect hop read from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Absolute target, resolved against the request URL.
    pub location: String,
    /// Cookies set alongside the redirect, ready for the next request.
    pub cookies: Option<String>,
}

/// Issue `request` without following redirects and read `Location`.
///
/// `Ok(None)` means the host answered without a redirect, which usually
/// means it changed behaviour. Transport failures are still errors.
pub async fn location(fetcher: &dyn HttpFetch, request: FetchRequest) -> Result<Option<Hop>> {
    let request = request.no_redirects();
    let response = fetcher.fetch(&request).await?;

    let Some(raw) = response.location() else {
        return Ok(None);
    };
    let location = Url::parse(&request.url)
        .and_then(|base| base.join(raw))
        .map_or_else(|_| raw.to_string(), |u| u.to_string());

    Ok(Some(Hop {
        location,
        cookies: response.cookie_header(),
    }))
}
