use anyhow::Result;

use embedscout::ResolveOutcome;

use crate::OutputFormat;

pub fn print_outcome(outcome: &ResolveOutcome, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    for stream in &outcome.streams {
        println!(
            "{:<12} {:>7} {:<11} {}",
            stream.source_name,
            stream.quality.to_string(),
            stream.media_kind.as_str(),
            stream.stream_url
        );
    }
    for track in &outcome.subtitles {
        println!("{:<12} {:>7} {:<11} {}", "subtitle", "", track.language, track.url);
    }

    for skipped in &outcome.skipped {
        eprintln!("skipped {}: {}", skipped.url, skipped.reason);
    }
    if outcome.success && outcome.streams.is_empty() {
        eprintln!("no playable source found");
    }

    Ok(())
}
