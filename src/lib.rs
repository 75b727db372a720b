//! Partwise MusicXML to MNX-style JSON conversion
//!
//! This crate reads partwise MusicXML documents and rebuilds them as an
//! explicit, reference-linked score model: numbered start/stop markup
//! becomes ID-linked spans, chords and tuplets become nested containers,
//! and every voice gets its own time-ordered sequence of events.

pub mod errors;
pub mod ids;
pub mod models;
pub mod musicxml;
pub mod validate;

// Re-export commonly used types
pub use errors::ScoreError;
pub use models::Score;
pub use musicxml::parse_musicxml;
pub use validate::{has_errors, validate, Finding, Severity};
