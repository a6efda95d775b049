use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use embedscout::{EmbedReference, ResolveError, Resolver, ResolverConfig};

use super::output::print_outcome;
use crate::OutputFormat;

/// Embed URLs from a file: one per line, blank lines and `#` comments skipped.
async fn read_embeds_file(path: &Path) -> Result<Vec<EmbedReference>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(EmbedReference::new)
        .collect())
}

pub async fn cmd_resolve(
    config: &ResolverConfig,
    embeds: Vec<String>,
    embeds_file: Option<&Path>,
    page: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let resolver = Resolver::from_config(config)?;
    let page = page.unwrap_or_default();

    // Ctrl-C abandons the whole batch
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = if let Some(path) = embeds_file {
        let listing = async {
            let mut list: Vec<EmbedReference> = embeds.iter().map(|u| EmbedReference::new(u.as_str())).collect();
            list.extend(read_embeds_file(path).await?);
            anyhow::Ok(list)
        };
        resolver.resolve_listing_until(listing, page, &cancel).await
    } else {
        let embeds = embeds.into_iter().map(EmbedReference::new).collect();
        resolver.resolve_all_until(embeds, page, &cancel).await
    };
    watcher.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(ResolveError::Cancelled) => anyhow::bail!("interrupted"),
        Err(e) => return Err(e.into()),
    };

    print_outcome(&outcome, format)?;
    if !outcome.success {
        anyhow::bail!("embed list unavailable");
    }
    Ok(())
}
