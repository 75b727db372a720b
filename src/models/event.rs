//! Sequence content: events, notes, nested containers and their attachments.

use serde::{Deserialize, Serialize};

use super::directions::{Dynamic, OctaveShift, Pedal, Wedge};
use super::rhythm::{NoteValue, TupletPortion};

/// One item of a sequence's content list.
///
/// Nested containers (tuplet, grace group) hold further items, so content
/// forms a tree rooted at the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SequenceItem {
    Event(Event),
    Tuplet(Tuplet),
    Grace(GraceGroup),
    Dynamic(Dynamic),
    Wedge(Wedge),
    OctaveShift(OctaveShift),
    Pedal(Pedal),
}

/// A sounding unit: either a rest or one or more simultaneous notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub duration: NoteValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<Rest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Slur descriptors whose origin is this event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slurs: Vec<Slur>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub articulations: Vec<Articulation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lyrics: Vec<Lyric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tremolo: Option<Tremolo>,
}

impl Event {
    pub fn new(id: String, duration: NoteValue) -> Self {
        Event {
            id,
            duration,
            rest: None,
            notes: Vec::new(),
            slurs: Vec::new(),
            articulations: Vec::new(),
            lyrics: Vec::new(),
            tremolo: None,
        }
    }
}

/// Rest marker payload (empty object in JSON)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rest {}

/// A single notehead within an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(flatten)]
    pub content: NoteContent,
    #[serde(
        rename = "accidentalDisplay",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub accidental_display: Option<AccidentalDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notehead: Option<Notehead>,
    /// Tie descriptors whose origin is this note
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ties: Vec<Tie>,
}

impl Note {
    pub fn new(id: String, content: NoteContent) -> Self {
        Note {
            id,
            content,
            accidental_display: None,
            notehead: None,
            ties: Vec::new(),
        }
    }
}

/// Pitched or unpitched (percussion) representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteContent {
    Pitch(Pitch),
    Unpitched(Unpitched),
}

/// Written pitch: step letter, octave, optional chromatic alteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    pub step: Step,
    pub octave: i8,
    /// Signed semitone alteration; affects sound only, never display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter: Option<i8>,
}

/// Staff placement for percussion notes without a sounding pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unpitched {
    pub step: Step,
    pub octave: i8,
}

/// Diatonic step letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Step {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A" => Some(Step::A),
            "B" => Some(Step::B),
            "C" => Some(Step::C),
            "D" => Some(Step::D),
            "E" => Some(Step::E),
            "F" => Some(Step::F),
            "G" => Some(Step::G),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::A => "A",
            Step::B => "B",
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
        }
    }
}

/// Explicit accidental display request.
///
/// Set only when the source carries an accidental element; an alteration
/// alone never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentalDisplay {
    pub show: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cautionary: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub editorial: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Notehead shape, restricted to a fixed keyword set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Notehead {
    Normal,
    Diamond,
    X,
    CircleX,
    Slash,
    Square,
    Triangle,
}

impl Notehead {
    /// Parse a `<notehead>` keyword; anything outside the set is dropped.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "normal" => Some(Notehead::Normal),
            "diamond" => Some(Notehead::Diamond),
            "x" => Some(Notehead::X),
            "circle-x" => Some(Notehead::CircleX),
            "slash" => Some(Notehead::Slash),
            "square" => Some(Notehead::Square),
            "triangle" => Some(Notehead::Triangle),
            _ => None,
        }
    }
}

/// Tie from this note to a later note of the same part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tie {
    pub target: String,
}

/// Slur from the carrying event to a later event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slur {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<SlurSide>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlurSide {
    Up,
    Down,
}

impl SlurSide {
    /// Map a `placement` attribute value to a side
    pub fn from_placement(placement: &str) -> Option<Self> {
        match placement {
            "above" => Some(SlurSide::Up),
            "below" => Some(SlurSide::Down),
            _ => None,
        }
    }
}

/// Recognized articulation keywords, plus fermata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Articulation {
    Accent,
    StrongAccent,
    Staccato,
    Staccatissimo,
    Tenuto,
    DetachedLegato,
    Spiccato,
    Fermata,
}

impl Articulation {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "accent" => Some(Articulation::Accent),
            "strong-accent" => Some(Articulation::StrongAccent),
            "staccato" => Some(Articulation::Staccato),
            "staccatissimo" => Some(Articulation::Staccatissimo),
            "tenuto" => Some(Articulation::Tenuto),
            "detached-legato" => Some(Articulation::DetachedLegato),
            "spiccato" => Some(Articulation::Spiccato),
            "fermata" => Some(Articulation::Fermata),
            _ => None,
        }
    }
}

/// Syllable position within a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syllabic {
    Single,
    Begin,
    Middle,
    End,
}

impl Syllabic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(Syllabic::Single),
            "begin" => Some(Syllabic::Begin),
            "middle" => Some(Syllabic::Middle),
            "end" => Some(Syllabic::End),
            _ => None,
        }
    }
}

/// One syllable of one lyric line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyric {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabic: Option<Syllabic>,
    /// Id of the lyric line this syllable belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
}

/// Tremolo marking.
///
/// A single-event tremolo carries its slash count; both halves of a
/// two-event tremolo carry the same generated id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tremolo {
    Single { marks: u8 },
    Multi { id: String },
}

/// Tuplet container: `inner` notes played in the written time of `outer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuplet {
    pub inner: TupletPortion,
    pub outer: TupletPortion,
    pub content: Vec<SequenceItem>,
}

/// Run of grace notes attached before the following event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slash: Option<bool>,
    pub content: Vec<SequenceItem>,
}
