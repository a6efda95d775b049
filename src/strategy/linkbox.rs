//! Linkbox share links. A share token resolves to an item id through the
//! public share-list API, and the item detail lists one URL per rendition.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{Resolution, Strategy};
use crate::error::Result;
use crate::http_client::{FetchRequest, HttpFetch};
use crate::pattern::regex_url;
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, Quality, StreamDescriptor};

const API_URL: &str = "https://www.linkbox.to";

static SHARE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:/f/|/file/|\?id=)(\w+)").expect("valid share token regex"));

pub struct Linkbox;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiReply {
    data: Option<ApiData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiData {
    item_id: Option<String>,
    item_info: Option<ItemInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ItemInfo {
    resolution_list: Vec<Rendition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Rendition {
    url: Option<String>,
    resolution: Option<String>,
}

impl Linkbox {
    async fn item_id(http: &dyn HttpFetch, token: &str) -> Result<Option<String>> {
        let url = format!(
            "{API_URL}/api/file/share_out_list/?sortField=utime&sortAsc=0&pageNo=1&pageSize=50&shareToken={}",
            urlencoding::encode(token)
        );
        let reply = http.fetch(&FetchRequest::get(url)).await?;
        Ok(reply
            .json::<ApiReply>()
            .ok()
            .and_then(|r| r.data)
            .and_then(|d| d.item_id)
            .filter(|id| !id.is_empty()))
    }
}

#[async_trait]
impl Strategy for Linkbox {
    fn name(&self) -> &'static str {
        "Linkbox"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![
            HostPredicate::Suffix("lbx.to"),
            HostPredicate::Suffix("linkbox.to"),
        ]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let Some(token) = regex_url::first_capture(&SHARE_TOKEN, &embed.url) else {
            debug!(url = %embed.url, "no share token in linkbox url");
            return Ok(Resolution::empty());
        };
        let Some(item_id) = Self::item_id(http, &token).await? else {
            return Ok(Resolution::empty());
        };

        let detail = http
            .fetch(
                &FetchRequest::get(format!("{API_URL}/api/file/detail?itemId={item_id}"))
                    .referer(Some(&embed.url)),
            )
            .await?;

        let renditions = detail
            .json::<ApiReply>()
            .ok()
            .and_then(|r| r.data)
            .and_then(|d| d.item_info)
            .map(|info| info.resolution_list)
            .unwrap_or_default();

        let streams = renditions
            .into_iter()
            .filter_map(|r| {
                let url = r.url.filter(|u| !u.is_empty())?;
                let quality = r.resolution.as_deref().map_or(Quality::Unknown, Quality::from_text);
                Some(
                    StreamDescriptor::new(self.name(), url)
                        .with_quality(quality)
                        .with_referer(format!("{API_URL}/")),
                )
            })
            .collect();

        Ok(Resolution::from_streams(streams))
    }
}
