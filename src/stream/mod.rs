//! Resolution data model
//!
//! An [`EmbedReference`] goes in, [`StreamDescriptor`]s and
//! [`SubtitleTrack`]s come out.

pub mod descriptor;
pub mod embed;
pub mod quality;

pub use descriptor::{MediaKind, StreamDescriptor, SubtitleTrack};
pub use embed::EmbedReference;
pub use quality::Quality;
