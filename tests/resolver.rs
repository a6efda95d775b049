//! End-to-end resolution against the built-in registry and an in-memory
//! fetcher. No network access.

use std::sync::Arc;
use std::time::Duration;

use embedscout::testing::MockFetcher;
use embedscout::{
    EmbedReference, MediaKind, Quality, Registry, ResolveError, Resolver, ResolverConfig, SkipReason,
    SubtitleTrack,
};
use tokio_util::sync::CancellationToken;

const PAGE: &str = "https://anime.example/show/episode-5";

fn resolver(mock: &MockFetcher) -> Resolver {
    resolver_with(mock, &ResolverConfig::default())
}

fn resolver_with(mock: &MockFetcher, config: &ResolverConfig) -> Resolver {
    Resolver::new(Registry::builtin(), Arc::new(mock.clone()), config)
}

fn embeds(urls: &[&str]) -> Vec<EmbedReference> {
    urls.iter().map(|u| EmbedReference::new(*u)).collect()
}

fn qiwi_page(file: &str) -> String {
    format!(r#"<title>{file} 720p</title><video><source src="https://cdn.qiwi.gg/{file}.mp4"></video>"#)
}

fn urls(outcome: &embedscout::ResolveOutcome) -> Vec<&str> {
    outcome.streams.iter().map(|s| s.stream_url.as_str()).collect()
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn output_follows_input_order_not_completion_order() {
    let mock = MockFetcher::new();
    mock.ok("https://qiwi.gg/file/a", &qiwi_page("a"))
        .delay("https://qiwi.gg/file/a", Duration::from_millis(300))
        .ok("https://qiwi.gg/file/b", &qiwi_page("b"))
        .delay("https://qiwi.gg/file/b", Duration::from_millis(100))
        .ok("https://qiwi.gg/file/c", &qiwi_page("c"));

    let outcome = resolver(&mock)
        .resolve_all(
            embeds(&["https://qiwi.gg/file/a", "https://qiwi.gg/file/b", "https://qiwi.gg/file/c"]),
            PAGE,
        )
        .await;

    assert_eq!(
        urls(&outcome),
        vec!["https://cdn.qiwi.gg/a.mp4", "https://cdn.qiwi.gg/b.mp4", "https://cdn.qiwi.gg/c.mp4"]
    );
}

#[tokio::test]
async fn order_holds_with_single_slot_fan_out() {
    let mock = MockFetcher::new();
    mock.ok("https://qiwi.gg/file/a", &qiwi_page("a"))
        .ok("https://qiwi.gg/file/b", &qiwi_page("b"));
    let config = ResolverConfig {
        max_concurrency: 1,
        ..ResolverConfig::default()
    };

    let outcome = resolver_with(&mock, &config)
        .resolve_all(embeds(&["https://qiwi.gg/file/b", "https://qiwi.gg/file/a"]), PAGE)
        .await;
    assert_eq!(urls(&outcome), vec!["https://cdn.qiwi.gg/b.mp4", "https://cdn.qiwi.gg/a.mp4"]);
}

#[tokio::test]
async fn strategy_internal_order_is_kept() {
    let mock = MockFetcher::new();
    mock.ok(
        "https://www.blogger.com/video.g?token=t",
        r#"<script>c = {"streams":[{"play_url":"https://rr.example/hi","format_id":37},{"play_url":"https://rr.example/lo","format_id":18}]}</script>"#,
    );

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://www.blogger.com/video.g?token=t"]), PAGE)
        .await;
    // discovery order, never re-sorted by quality
    let qualities: Vec<_> = outcome.streams.iter().map(|s| s.quality).collect();
    assert_eq!(qualities, vec![Quality::Height(1080), Quality::Height(360)]);
}

// ─── Deduplication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_stream_urls_collapse_to_first() {
    let mock = MockFetcher::new();
    mock.ok(
        "https://filemoon.sx/e/1",
        r#"<script>var p = "https://x/video.m3u8";</script>"#,
    );

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://filemoon.sx/e/1", "https://x/video.m3u8"]), PAGE)
        .await;

    assert_eq!(outcome.streams.len(), 1);
    assert_eq!(outcome.streams[0].stream_url, "https://x/video.m3u8");
    assert_eq!(outcome.streams[0].source_name, "Filemoon");
}

#[tokio::test]
async fn subtitles_are_deduplicated_by_url() {
    let page = |file: &str| {
        format!(
            r#"<script>setup({{sources:[{{file:"https://cdn.sw.example/{file}/master.m3u8"}}],tracks:[{{file:"https://cdn.sw.example/en.vtt",label:"English",kind:"captions"}}]}});</script>"#
        )
    };
    let mock = MockFetcher::new();
    mock.ok("https://streamwish.to/e/1", &page("one"))
        .ok("https://streamwish.com/e/2", &page("two"));

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://streamwish.to/e/1", "https://streamwish.com/e/2"]), PAGE)
        .await;

    assert_eq!(outcome.streams.len(), 2);
    assert_eq!(
        outcome.subtitles,
        vec![SubtitleTrack::new("English", "https://cdn.sw.example/en.vtt")]
    );
}

// ─── Failure isolation ───────────────────────────────────────────────────────

#[tokio::test]
async fn failing_siblings_do_not_affect_each_other() {
    let mock = MockFetcher::new();
    mock.respond("https://qiwi.gg/file/down", 503, "unavailable", &[])
        .timeout("https://qiwi.gg/file/slow")
        .panic("https://qiwi.gg/file/boom")
        .ok("https://qiwi.gg/file/ok", &qiwi_page("ok"))
        .ok("https://kuramadrive.com/kdrive/bad", r#"<meta name="csrf-token" content="t"><input id="routeCheckAvl" value="/r">"#)
        .ok("https://kuramadrive.com/r", "not json");

    let outcome = resolver(&mock)
        .resolve_all(
            embeds(&[
                "https://qiwi.gg/file/down",
                "https://qiwi.gg/file/slow",
                "https://qiwi.gg/file/boom",
                "https://kuramadrive.com/kdrive/bad",
                "https://qiwi.gg/file/ok",
            ]),
            PAGE,
        )
        .await;

    assert!(outcome.success);
    assert_eq!(urls(&outcome), vec!["https://cdn.qiwi.gg/ok.mp4"]);
    assert_eq!(outcome.skipped.len(), 4);
    assert!(outcome
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Failed(_))));
}

#[tokio::test]
async fn unsupported_host_is_a_skip() {
    let mock = MockFetcher::new();
    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://unregistered.example/embed/9"]), PAGE)
        .await;

    assert!(outcome.success);
    assert!(outcome.streams.is_empty());
    assert_eq!(outcome.skipped[0].reason, SkipReason::UnsupportedHost);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn empty_embed_list_is_an_empty_success() {
    let outcome = resolver(&MockFetcher::new()).resolve_all(Vec::new(), PAGE).await;
    assert!(outcome.success);
    assert!(outcome.streams.is_empty() && outcome.skipped.is_empty());
}

// ─── Reference scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn json_host_unregistered_host_and_empty_page() {
    let mock = MockFetcher::new();
    mock.ok(
        "https://www.linkbox.to/api/file/share_out_list/?sortField=utime&sortAsc=0&pageNo=1&pageSize=50&shareToken=A1",
        r#"{"data":{"itemId":"10"}}"#,
    )
    .ok(
        "https://www.linkbox.to/api/file/detail?itemId=10",
        r#"{"data":{"itemInfo":{"resolutionList":[{"url":"https://cdn.linkbox.to/10/720.mp4","resolution":"720p"}]}}}"#,
    )
    .ok("https://qiwi.gg/file/C", "<html><body>nothing to see</body></html>");

    let outcome = resolver(&mock)
        .resolve_all(
            embeds(&["https://lbx.to/f/A1", "https://unregistered.example/B", "https://qiwi.gg/file/C"]),
            PAGE,
        )
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.streams.len(), 1);
    assert_eq!(outcome.streams[0].quality, Quality::Height(720));
    assert_eq!(outcome.streams[0].source_name, "Linkbox");
}

#[tokio::test]
async fn redirect_without_location_yields_nothing() {
    let mock = MockFetcher::new();
    mock.ok("https://racaty.io/f/gone", "<html>404 file not found</html>");

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://racaty.io/f/gone"]), PAGE)
        .await;
    assert!(outcome.success);
    assert!(outcome.streams.is_empty());
    assert!(outcome.skipped.is_empty());
}

// ─── Referer propagation ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_referer_is_filled_from_page() {
    let mock = MockFetcher::new();
    mock.ok("https://zippysha.re/v/k/file.html", r#"<a id="download-url" href="/d/k/ep.mp4">dl</a>"#);

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://zippysha.re/v/k/file.html"]), PAGE)
        .await;
    assert_eq!(outcome.streams[0].referer.as_deref(), Some(PAGE));
    assert_eq!(
        mock.requests_to("https://zippysha.re/v/k/file.html")[0].referer.as_deref(),
        Some(PAGE)
    );
}

#[tokio::test]
async fn strategy_referer_wins_over_page() {
    let mock = MockFetcher::new();
    mock.ok(
        "https://uservideo.xyz/file/ep5",
        r#"<iframe id="videoFrame" src="https://new.uservideo.xyz/player/ep5"></iframe>"#,
    )
    .ok(
        "https://new.uservideo.xyz/player/ep5",
        "<script>\nvar VIDEO_CONFIG = {\"streams\":[{\"play_url\":\"https://v.uservideo.xyz/a.mp4\",\"format_id\":18}]};\n</script>",
    );

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://uservideo.xyz/file/ep5"]), PAGE)
        .await;
    assert_eq!(outcome.streams[0].referer.as_deref(), Some("https://new.uservideo.xyz/"));
}

#[tokio::test]
async fn strategy_without_referer_requirement_drops_it() {
    let mock = MockFetcher::new();
    mock.ok(
        "https://www.blogger.com/video.g?token=r",
        r#"<script>c = {"streams":[{"play_url":"https://rr.example/v","format_id":22}]}</script>"#,
    );
    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://www.blogger.com/video.g?token=r"]), PAGE)
        .await;
    assert!(outcome.streams[0].referer.is_none());
}

// ─── Recursive dispatch ──────────────────────────────────────────────────────

#[tokio::test]
async fn delegates_resolve_through_other_strategies() {
    let mock = MockFetcher::new();
    // data-frame = base64("https://qiwi.gg/file/q")
    mock.ok(
        "https://kotakajaib.me/file/k",
        r#"<ul id="dropdown-server"><li><a data-frame="aHR0cHM6Ly9xaXdpLmdnL2ZpbGUvcQ==">Qiwi</a></li></ul>"#,
    )
    .ok("https://qiwi.gg/file/q", &qiwi_page("q"));

    let outcome = resolver(&mock)
        .resolve_all(embeds(&["https://kotakajaib.me/file/k"]), PAGE)
        .await;

    assert_eq!(urls(&outcome), vec!["https://cdn.qiwi.gg/q.mp4"]);
    assert_eq!(outcome.streams[0].source_name, "Qiwi");
    assert_eq!(
        mock.requests_to("https://qiwi.gg/file/q")[0].referer.as_deref(),
        Some("https://kotakajaib.me/")
    );
}

#[tokio::test]
async fn self_referencing_wrapper_stops_at_depth_cap() {
    let mock = MockFetcher::new();
    // data-frame = base64("https://kotakajaib.me/file/loop")
    mock.ok(
        "https://kotakajaib.me/file/loop",
        r#"<ul id="dropdown-server"><li><a data-frame="aHR0cHM6Ly9rb3Rha2FqYWliLm1lL2ZpbGUvbG9vcA==">Again</a></li></ul>"#,
    );
    let config = ResolverConfig {
        max_depth: 2,
        ..ResolverConfig::default()
    };

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        resolver_with(&mock, &config).resolve_all(embeds(&["https://kotakajaib.me/file/loop"]), PAGE),
    )
    .await
    .expect("recursion must be bounded");

    assert!(outcome.streams.is_empty());
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].reason, SkipReason::DepthExceeded);
    assert_eq!(mock.requests().len(), 3);
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancellation_discards_everything_and_stops_work() {
    let mock = MockFetcher::new();
    mock.ok("https://qiwi.gg/file/fast", &qiwi_page("fast"))
        .ok(
            "https://uservideo.xyz/file/slow",
            r#"<iframe id="videoFrame" src="https://new.uservideo.xyz/p/slow"></iframe>"#,
        )
        .delay("https://uservideo.xyz/file/slow", Duration::from_millis(300))
        .ok("https://new.uservideo.xyz/p/slow", "VIDEO_CONFIG = {\"streams\":[]}");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let resolver = resolver(&mock);
    let result = resolver
        .resolve_all_until(
            embeds(&["https://qiwi.gg/file/fast", "https://uservideo.xyz/file/slow"]),
            PAGE,
            &cancel,
        )
        .await;
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, ResolveError::Cancelled));

    // the dropped uservideo future never reaches its second fetch
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(mock.requests_to("https://new.uservideo.xyz/p/slow").is_empty());
}

#[tokio::test]
async fn untriggered_token_returns_full_outcome() {
    let mock = MockFetcher::new();
    mock.ok("https://qiwi.gg/file/a", &qiwi_page("a"));

    let outcome = tokio_test::assert_ok!(
        resolver(&mock)
            .resolve_all_until(embeds(&["https://qiwi.gg/file/a"]), PAGE, &CancellationToken::new())
            .await
    );
    assert_eq!(outcome.streams[0].media_kind, MediaKind::ProgressiveVideo);
}
