//! `embedscout` - embed-to-stream resolution
//!
//! Turns the third-party player embeds found on a content page into
//! directly playable stream descriptors.
//!
//! # Features
//!
//! - **Registry dispatch**: ordered host predicates pick one strategy per embed
//! - **Per-site strategies**: DOM attributes, inline-script JSON, redirect
//!   chains, base64-wrapped mirrors
//! - **Concurrent fan-out**: input-ordered results, first-seen dedup,
//!   failure isolation per embed
//! - **Bounded recursion**: wrapper hosts re-enter dispatch up to a depth cap
//!
//! # Example
//!
//! ```rust,no_run
//! use embedscout::{EmbedReference, ResolverConfig, Resolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = Resolver::from_config(&ResolverConfig::default())?;
//!     let outcome = resolver
//!         .resolve_all(
//!             vec![EmbedReference::new("https://qiwi.gg/file/abc")],
//!             "https://anime.example/episode-1",
//!         )
//!         .await;
//!     for stream in &outcome.streams {
//!         println!("{} {} {}", stream.source_name, stream.quality, stream.stream_url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http_client;
pub mod pattern;
pub mod registry;
pub mod resolver;
pub mod stream;
pub mod strategy;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use fingerprint::{chrome_profile, firefox_profile, random_profile, BrowserProfile};
pub use http_client::{AcceleratedClient, FetchRequest, FetchResponse, HttpFetch};
pub use registry::{HostPredicate, Registry, RegistryBuilder};
pub use resolver::{ResolveOutcome, Resolver, SkipReason, SkippedEmbed};
pub use stream::{EmbedReference, MediaKind, Quality, StreamDescriptor, SubtitleTrack};
pub use strategy::{Resolution, Strategy};

/// Version of embedscout
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
