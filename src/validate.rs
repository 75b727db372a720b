//! Downstream structural checks over a converted score
//!
//! The conversion itself never rejects odd rhythms or out-of-range pitches;
//! this optional pass reports them as data so callers can decide what to do
//! with them. Each finding carries a JSON-style path into the document
//! (e.g. `parts[0].measures[2].sequences[1]`), a severity, and a
//! machine-readable kind.

use std::collections::HashSet;
use std::fmt;

use num_rational::Ratio;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::{
    Global, Note, NoteContent, NoteValue, PedalKind, RhythmicPosition, Score, SequenceItem,
    TimeSignature, Tuplet,
};

/// Severity level for validation findings
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single issue found in a converted score
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Finding {
    /// Path into the JSON document (e.g. "parts[0].measures[1].sequences[0]")
    pub path: String,
    /// Severity level
    pub severity: Severity,
    /// Kind identifier (e.g. "measure_alignment", "octave_range")
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl Finding {
    pub fn new(
        path: impl Into<String>,
        severity: Severity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

/// Check if any finding is error severity
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

/// Dynamic mark keywords in conventional use; anything else only warns,
/// enum membership proper is the downstream schema's job
static DYNAMIC_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "p", "pp", "ppp", "pppp", "ppppp", "pppppp", "f", "ff", "fff", "ffff", "fffff", "ffffff",
        "mp", "mf", "pf", "sf", "sfp", "sfpp", "sfz", "sfzp", "sffz", "fp", "fz", "rf", "rfz", "n",
    ]
    .into_iter()
    .collect()
});

/// Run every check over a converted score.
///
/// Never fails; an empty result means the score passed. Sequences without
/// any rhythmic content (direction-only voices) are skipped by the duration
/// check, and measures with no effective time signature are not summed at
/// all.
pub fn validate(score: &Score) -> Vec<Finding> {
    let mut findings = Vec::new();
    let times = effective_times(&score.global);

    for (p, part) in score.parts.iter().enumerate() {
        if part.measures.len() != score.global.measures.len() {
            findings.push(Finding::new(
                format!("parts[{p}]"),
                Severity::Error,
                "measure_alignment",
                format!(
                    "part has {} measures but the global list has {}",
                    part.measures.len(),
                    score.global.measures.len()
                ),
            ));
        }

        for (m, measure) in part.measures.iter().enumerate() {
            let span = times
                .get(m)
                .copied()
                .flatten()
                .filter(|time| time.unit > 0)
                .map(|time| Ratio::new(u64::from(time.count), u64::from(time.unit)));

            for (s, sequence) in measure.sequences.iter().enumerate() {
                let path = format!("parts[{p}].measures[{m}].sequences[{s}]");
                let (written, has_rhythm) =
                    walk_content(&sequence.content, &path, &mut findings);
                if has_rhythm {
                    if let Some(span) = span {
                        if written != span {
                            findings.push(Finding::new(
                                path,
                                Severity::Warning,
                                "measure_duration",
                                format!(
                                    "sequence spans {written} of a whole note but the time signature implies {span}"
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    findings
}

/// Time signature in effect at each global measure index (the last explicit
/// one persists; `None` until the first appears)
fn effective_times(global: &Global) -> Vec<Option<TimeSignature>> {
    let mut current = None;
    global
        .measures
        .iter()
        .map(|measure| {
            if let Some(time) = measure.time {
                current = Some(time);
            }
            current
        })
        .collect()
}

/// Recursively sum the written duration of a content list while checking
/// octave bounds, position units, span closure, and dynamic keywords.
///
/// Returns the sum as a fraction of a whole note plus whether any rhythmic
/// item (event or tuplet) was present. Grace content is walked for checks
/// but contributes zero time.
fn walk_content(
    content: &[SequenceItem],
    base: &str,
    findings: &mut Vec<Finding>,
) -> (Ratio<u64>, bool) {
    let mut total = Ratio::from_integer(0);
    let mut has_rhythm = false;

    for (index, item) in content.iter().enumerate() {
        let path = format!("{base}.content[{index}]");
        match item {
            SequenceItem::Event(event) => {
                has_rhythm = true;
                total += note_value_ratio(&event.duration);
                for (n, note) in event.notes.iter().enumerate() {
                    check_note_octave(note, &format!("{path}.notes[{n}]"), findings);
                }
            }
            SequenceItem::Tuplet(tuplet) => {
                has_rhythm = true;
                let (inner, _) = walk_content(&tuplet.content, &path, findings);
                total += match tuplet_scale(tuplet) {
                    Some(scale) => inner * scale,
                    None => inner,
                };
            }
            SequenceItem::Grace(group) => {
                let _ = walk_content(&group.content, &path, findings);
            }
            SequenceItem::Dynamic(dynamic) => {
                check_position(dynamic.position, &path, findings);
                if !DYNAMIC_KEYWORDS.contains(dynamic.value.as_str()) {
                    findings.push(Finding::new(
                        path.clone(),
                        Severity::Warning,
                        "dynamic_keyword",
                        format!("unconventional dynamic mark '{}'", dynamic.value),
                    ));
                }
            }
            SequenceItem::Wedge(wedge) => {
                check_position(wedge.position, &path, findings);
                if wedge.end.is_none() {
                    findings.push(Finding::new(
                        path.clone(),
                        Severity::Warning,
                        "open_span",
                        "wedge never closed",
                    ));
                }
            }
            SequenceItem::OctaveShift(shift) => {
                check_position(shift.position, &path, findings);
                if shift.end.is_none() {
                    findings.push(Finding::new(
                        path.clone(),
                        Severity::Warning,
                        "open_span",
                        "octave shift never closed",
                    ));
                }
            }
            SequenceItem::Pedal(pedal) => {
                check_position(pedal.position, &path, findings);
                if pedal.kind == PedalKind::Line && pedal.end.is_none() {
                    findings.push(Finding::new(
                        path.clone(),
                        Severity::Warning,
                        "open_span",
                        "pedal line never closed",
                    ));
                }
            }
        }
    }

    (total, has_rhythm)
}

/// Written length of a note value as a fraction of a whole note.
///
/// Each augmentation dot extends the value by half of the previous
/// extension, so `dots` dots multiply the base by (2^(dots+1) - 1) / 2^dots.
fn note_value_ratio(value: &NoteValue) -> Ratio<u64> {
    let (numerator, denominator) = value.base.whole_note_fraction();
    let base = Ratio::new(numerator, denominator);
    // anything past a handful of dots is noise input; cap before shifting
    let dots = u32::from(value.dots.min(8));
    if dots == 0 {
        return base;
    }
    base * Ratio::new((1u64 << (dots + 1)) - 1, 1u64 << dots)
}

/// Factor that maps a tuplet's inner (written) time onto the span it
/// actually occupies. `None` when either portion is degenerate.
fn tuplet_scale(tuplet: &Tuplet) -> Option<Ratio<u64>> {
    let inner = note_value_ratio(&tuplet.inner.duration)
        * Ratio::from_integer(u64::from(tuplet.inner.multiple));
    let outer = note_value_ratio(&tuplet.outer.duration)
        * Ratio::from_integer(u64::from(tuplet.outer.multiple));
    if *inner.numer() == 0 || *outer.numer() == 0 {
        return None;
    }
    Some(outer / inner)
}

fn check_note_octave(note: &Note, path: &str, findings: &mut Vec<Finding>) {
    let octave = match &note.content {
        NoteContent::Pitch(pitch) => pitch.octave,
        NoteContent::Unpitched(unpitched) => unpitched.octave,
    };
    if !(0..=9).contains(&octave) {
        findings.push(Finding::new(
            path,
            Severity::Error,
            "octave_range",
            format!("octave {octave} is outside the writable range 0..=9"),
        ));
    }
}

/// Positions count ticks against a whole-note unit of 4 x divisions, so a
/// denominator that is not a multiple of 4 cannot have come from one
fn check_position(position: RhythmicPosition, path: &str, findings: &mut Vec<Finding>) {
    if position.fraction.denominator % 4 != 0 {
        findings.push(Finding::new(
            path,
            Severity::Warning,
            "position_unit",
            format!(
                "position denominator {} is not a whole-note tick unit",
                position.fraction.denominator
            ),
        ));
    }
}
