//! LayarAnime episode player. The Alpine.js `x-data` attribute on
//! `div#player` is a `playerPage({...})` call whose argument maps server
//! groups to wrapper URLs of the form `.../embed?url=<real player>`.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::{ResolveError, Result};
use crate::http_client::HttpFetch;
use crate::pattern::{dom, script};
use crate::registry::HostPredicate;
use crate::stream::EmbedReference;

pub struct LayarAnime;

/// Strip a wrapper down to its `?url=` target (last occurrence).
fn unwrap_target(server: &str) -> String {
    let target = server
        .rfind("?url=")
        .map_or(server, |at| &server[at + "?url=".len()..]);
    urlencoding::decode(target).map_or_else(|_| target.to_string(), |t| t.into_owned())
}

/// Server URLs from the player's `x-data`, in server-key order.
fn player_servers(html: &str) -> Result<Vec<String>> {
    let Some(x_data) = dom::select_attr(html, "div#player[x-data]", "x-data") else {
        return Ok(Vec::new());
    };
    let argument = script::slice_outer(&x_data, "playerPage(", ")")
        .unwrap_or(&x_data)
        .trim()
        .trim_matches('\'');

    let groups = script::parse_lenient::<BTreeMap<String, Vec<String>>>(argument)
        .ok_or_else(|| ResolveError::parse("unreadable playerPage data"))?;
    Ok(groups
        .into_values()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[async_trait]
impl Strategy for LayarAnime {
    fn name(&self) -> &'static str {
        "LayarAnime"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("layaranime.com")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;

        let delegates = player_servers(page.text())?
            .iter()
            .map(|server| unwrap_target(server))
            .filter(|target| !target.is_empty())
            .map(|target| EmbedReference::new(target).with_referer(embed.url.clone()))
            .collect();

        Ok(Resolution::from_delegates(delegates))
    }
}
