//! Top-level score model: global measure data, parts, sequences.

use serde::{Deserialize, Serialize};

use super::event::SequenceItem;

/// Complete converted score, the JSON document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub mnx: MnxMeta,
    pub global: Global,
    pub parts: Vec<Part>,
}

impl Score {
    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to an indented JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Format metadata stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnxMeta {
    pub version: u32,
}

impl Default for MnxMeta {
    fn default() -> Self {
        MnxMeta { version: 1 }
    }
}

/// Score-wide data shared by all parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    pub measures: Vec<GlobalMeasure>,
}

/// Per-measure attributes read from the reference part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMeasure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeySignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barline: Option<Barline>,
}

/// Time signature as `count` units of `1/unit` whole notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub count: u32,
    pub unit: u32,
}

/// Key signature as a count of sharps (positive) or flats (negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    pub fifths: i8,
}

/// Barline drawn at the end of a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barline {
    #[serde(rename = "type")]
    pub type_: BarlineKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarlineKind {
    Regular,
    Dotted,
    Dashed,
    Double,
    Final,
    Heavy,
    HeavyHeavy,
    HeavyLight,
    NoBarline,
    Short,
    Tick,
}

impl BarlineKind {
    /// Map a MusicXML `<bar-style>` value
    pub fn from_bar_style(style: &str) -> Option<Self> {
        match style {
            "regular" => Some(BarlineKind::Regular),
            "dotted" => Some(BarlineKind::Dotted),
            "dashed" => Some(BarlineKind::Dashed),
            "light-light" => Some(BarlineKind::Double),
            "light-heavy" => Some(BarlineKind::Final),
            "heavy" => Some(BarlineKind::Heavy),
            "heavy-heavy" => Some(BarlineKind::HeavyHeavy),
            "heavy-light" => Some(BarlineKind::HeavyLight),
            "none" => Some(BarlineKind::NoBarline),
            "short" => Some(BarlineKind::Short),
            "tick" => Some(BarlineKind::Tick),
            _ => None,
        }
    }
}

/// One instrumental part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub measures: Vec<PartMeasure>,
    /// Lyric lines referenced by this part's syllables, in first-seen order
    #[serde(
        rename = "lyricLines",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub lyric_lines: Vec<LyricLine>,
}

/// Stable identity for one verse of lyrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub id: String,
    pub label: String,
}

/// One part's content for one measure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartMeasure {
    pub sequences: Vec<Sequence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beams: Vec<Beam>,
}

/// Time-ordered content of one voice within one measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub voice: String,
    pub content: Vec<SequenceItem>,
}

/// Beam over an ordered run of events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beam {
    pub events: Vec<String>,
}
