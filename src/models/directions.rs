//! Direction items: dynamics and the spans that may cross measures.

use serde::{Deserialize, Serialize};

use super::rhythm::{RhythmicPosition, SpanEnd};

/// A dynamic mark ("p", "ff", ...) at a rhythmic position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dynamic {
    pub value: String,
    pub position: RhythmicPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WedgeKind {
    Crescendo,
    Diminuendo,
}

/// Crescendo or diminuendo hairpin.
///
/// `end` stays `None` while the span is open; the close marker may arrive
/// in a later measure of the same part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wedge {
    pub kind: WedgeKind,
    pub position: RhythmicPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SpanEnd>,
}

/// Octave shift span.
///
/// `value` counts octaves of displacement for the written notes: positive
/// for an "8vb"-style shift (sounding below written), negative for "8va".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctaveShift {
    pub value: i8,
    pub position: RhythmicPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SpanEnd>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PedalKind {
    /// Bracket pedal line with a start and an end
    Line,
    /// Discrete "Ped." glyph
    Down,
    /// Discrete release glyph
    Release,
}

/// Sustain pedal marking, either a line span or a standalone sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pedal {
    pub kind: PedalKind,
    pub position: RhythmicPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SpanEnd>,
}
