//! XML access layer for MusicXML documents
//!
//! Thin wrappers around roxmltree. Child access always goes through
//! [`children`], which treats any element position as "zero, one, or many"
//! uniformly, so callers never special-case a singular child. Leaf parsers
//! return `Option` and leave defaulting decisions to the interpreter.

use std::str::FromStr;

use roxmltree::{Document, Node, ParsingOptions};

use crate::errors::ScoreError;
use crate::models::{
    Barline, BarlineKind, DurationBase, KeySignature, NoteValue, Pitch, Step, TimeSignature,
    Unpitched,
};

/// Parse an XML string. MusicXML files routinely carry a DOCTYPE, so DTD
/// parsing is enabled (entities are still bounded by roxmltree's limits).
pub fn parse_document(xml: &str) -> Result<Document<'_>, ScoreError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(xml, options)
        .map_err(|e| ScoreError::InvalidXml(e.to_string()))
}

/// Get the `<score-partwise>` root, the only accepted document shape
pub fn partwise_root<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>, ScoreError> {
    let root = doc.root_element();
    if root.tag_name().name() != "score-partwise" {
        return Err(ScoreError::UnsupportedRoot(
            root.tag_name().name().to_string(),
        ));
    }
    Ok(root)
}

/// All child elements with the given tag name, in document order
pub fn children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

/// First child element with the given tag name
pub fn child<'a, 'input>(node: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    children(node, tag).next()
}

/// Text content of the first child with the given tag
pub fn child_text<'a, 'input>(node: Node<'a, 'input>, tag: &'static str) -> Option<&'a str> {
    child(node, tag).and_then(|n| n.text()).map(str::trim)
}

/// Parsed text content of the first child with the given tag
pub fn child_parse<T: FromStr>(node: Node, tag: &'static str) -> Option<T> {
    child_text(node, tag).and_then(|s| s.parse().ok())
}

/// Parsed attribute value
pub fn attr_parse<T: FromStr>(node: Node, name: &str) -> Option<T> {
    node.attribute(name).and_then(|s| s.trim().parse().ok())
}

/// True when the attribute is present with value "yes"
pub fn attr_is_yes(node: Node, name: &str) -> bool {
    node.attribute(name) == Some("yes")
}

/// Parse a `<pitch>` element; a missing or unknown step or octave makes the
/// whole pitch unusable
pub fn parse_pitch(node: Node) -> Option<Pitch> {
    let step = Step::from_name(child_text(node, "step")?)?;
    let octave: i8 = child_parse(node, "octave")?;
    // <alter> may carry microtonal values; only integral semitones survive
    let alter = child_text(node, "alter")
        .and_then(|s| s.parse::<f32>().ok())
        .map(|a| a.round() as i8)
        .filter(|a| *a != 0);
    Some(Pitch {
        step,
        octave,
        alter,
    })
}

/// Parse an `<unpitched>` element (display-step / display-octave)
pub fn parse_unpitched(node: Node) -> Option<Unpitched> {
    let step = Step::from_name(child_text(node, "display-step")?)?;
    let octave: i8 = child_parse(node, "display-octave")?;
    Some(Unpitched { step, octave })
}

/// Symbolic duration of a note: `<type>` plus `<dot>` count.
///
/// A missing or unknown type falls back to a quarter, never an error.
pub fn parse_note_value(note: Node) -> NoteValue {
    let base = match child_text(note, "type") {
        Some(name) => DurationBase::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown note type '{}', defaulting to quarter", name);
            DurationBase::Quarter
        }),
        None => DurationBase::Quarter,
    };
    let dots = children(note, "dot").count() as u8;
    NoteValue { base, dots }
}

/// Parse a `<time>` element (beats / beat-type)
pub fn parse_time(node: Node) -> Option<TimeSignature> {
    let count: u32 = child_parse(node, "beats")?;
    let unit: u32 = child_parse(node, "beat-type")?;
    if count == 0 || unit == 0 {
        return None;
    }
    Some(TimeSignature { count, unit })
}

/// Parse a `<key>` element (fifths)
pub fn parse_key(node: Node) -> Option<KeySignature> {
    let fifths: i8 = child_parse(node, "fifths")?;
    Some(KeySignature { fifths })
}

/// Parse a `<barline>` element's bar-style
pub fn parse_barline(node: Node) -> Option<Barline> {
    let style = child_text(node, "bar-style")?;
    let type_ = BarlineKind::from_bar_style(style)?;
    Some(Barline { type_ })
}
