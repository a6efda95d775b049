//! DOM-attribute extraction.
//!
//! Each helper parses the document itself and returns owned strings.
//! `scraper::Html` is not `Send`, so it must never live across an
//! `.await` in a strategy.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("invalid selector {css:?}: {e:?}");
            None
        }
    }
}

fn attr_of(el: ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `attr` of the first element matching `css` that has it non-empty.
pub fn select_attr(html: &str, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).find_map(|el| attr_of(el, attr));
    found
}

/// Non-empty `attr` values of every element matching `css`, in document order.
pub fn select_attrs(html: &str, css: &str, attr: &str) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).filter_map(|el| attr_of(el, attr)).collect();
    found
}

/// Whitespace-collapsed text of the first element matching `css`.
pub fn select_text(html: &str, css: &str) -> Option<String> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let text = doc.select(&sel).next().map(|el| {
        el.text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    });
    text.filter(|t| !t.is_empty())
}

/// Bodies of inline `<script>` elements containing `marker`.
pub fn scripts_containing(html: &str, marker: &str) -> Vec<String> {
    let Some(sel) = selector("script") else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let found = doc
        .select(&sel)
        .map(|el| el.text().collect::<String>())
        .filter(|body| body.contains(marker))
        .collect();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><title>  Episode 5
            [720p] </title>
        <meta name="csrf-token" content="tok123">
        <script>var a = 1;</script>
        <script>jwplayer().setup({ sources: [{file:"https://cdn.example/a.m3u8"}] });</script>
        </head><body>
        <iframe id="videoFrame" src="https://frame.example/e/1"></iframe>
        <iframe src=""></iframe>
        <ul id="dropdown-server">
            <li><a data-frame="aHR0cHM6Ly9hLmV4YW1wbGUv">A</a></li>
            <li><a>no frame</a></li>
            <li><a data-frame="aHR0cHM6Ly9iLmV4YW1wbGUv">B</a></li>
        </ul>
        </body></html>"#;

    #[test]
    fn reads_first_matching_attribute() {
        assert_eq!(
            select_attr(PAGE, "iframe#videoFrame", "src").as_deref(),
            Some("https://frame.example/e/1")
        );
        assert_eq!(
            select_attr(PAGE, "meta[name=csrf-token]", "content").as_deref(),
            Some("tok123")
        );
    }

    #[test]
    fn absent_element_is_none() {
        assert!(select_attr(PAGE, "video source", "src").is_none());
        assert!(select_attr("", "iframe", "src").is_none());
    }

    #[test]
    fn invalid_selector_is_none() {
        assert!(select_attr(PAGE, "iframe[", "src").is_none());
        assert!(select_attrs(PAGE, ":::", "src").is_empty());
    }

    #[test]
    fn collects_all_attributes_skipping_empty() {
        let frames = select_attrs(PAGE, "ul#dropdown-server li a", "data-frame");
        assert_eq!(frames.len(), 2);
        assert_eq!(select_attrs(PAGE, "iframe", "src").len(), 1);
    }

    #[test]
    fn text_is_collapsed() {
        assert_eq!(select_text(PAGE, "title").as_deref(), Some("Episode 5 [720p]"));
    }

    #[test]
    fn finds_scripts_by_marker() {
        let scripts = scripts_containing(PAGE, "sources:");
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("a.m3u8"));
        assert!(scripts_containing(PAGE, "player.on").is_empty());
    }
}
