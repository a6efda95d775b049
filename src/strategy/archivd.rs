//! Archivd: an Inertia.js app that serializes page props into
//! `div#app[data-page]`.

use async_trait::async_trait;
use serde::Deserialize;

use super::{fetch_embed, Resolution, Strategy};
use crate::error::Result;
use crate::http_client::HttpFetch;
use crate::pattern::{dom, script};
use crate::registry::HostPredicate;
use crate::stream::{EmbedReference, StreamDescriptor};

const MAIN_URL: &str = "https://archivd.net";

pub struct Archivd;

#[async_trait]
impl Strategy for Archivd {
    fn name(&self) -> &'static str {
        "Archivd"
    }

    fn hosts(&self) -> Vec<HostPredicate> {
        vec![HostPredicate::Suffix("archivd.net")]
    }

    async fn resolve(&self, http: &dyn HttpFetch, embed: &EmbedReference) -> Result<Resolution> {
        let page = fetch_embed(http, embed).await?;

        let media = dom::select_attr(page.text(), "div#app", "data-page")
            .and_then(|json| script::parse_lenient::<PageData>(&json))
            .and_then(PageData::media);

        Ok(media.map_or_else(Resolution::empty, |url| {
            Resolution::from_streams(vec![
                StreamDescriptor::new(self.name(), url).with_referer(format!("{MAIN_URL}/"))
            ])
        }))
    }
}

#[derive(Debug, Deserialize)]
struct PageData {
    props: Option<Props>,
}

#[derive(Debug, Deserialize)]
struct Props {
    datas: Option<Datas>,
}

#[derive(Debug, Deserialize)]
struct Datas {
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    link: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    media: Option<String>,
}

impl PageData {
    fn media(self) -> Option<String> {
        self.props?
            .datas?
            .data?
            .link?
            .media
            .filter(|m| !m.trim().is_empty())
    }
}
