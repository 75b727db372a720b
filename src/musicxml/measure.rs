//! The per-measure token interpreter
//!
//! Consumes one measure's ordered token stream and rebuilds per-voice
//! sequences: chord members fold into a buffered "current event", tuplet
//! markers open and close nested containers, grace notes collect into
//! groups, and span markers go through the part-scoped registries. The
//! interpreter never aborts; malformed content degrades to defaults or is
//! dropped with a log line.

use std::collections::HashMap;

use roxmltree::Node;

use crate::ids::IdFactory;
use crate::models::{
    AccidentalDisplay, Articulation, Beam, Dynamic, DurationBase, Event, GraceGroup, Lyric, Note,
    NoteContent, NoteValue, Notehead, OctaveShift, PartMeasure, Pedal, PedalKind, Rest,
    RhythmicPosition, Sequence, SequenceItem, SlurSide, SpanEnd, Syllabic, Tremolo, Tuplet,
    TupletPortion, Wedge, WedgeKind,
};

use super::cursor::TimeCursor;
use super::parser;
use super::spans::{ContentLocator, PartContext};
use super::tokens::{token_stream, TokenKind};

/// Interpret one measure of one part into per-voice sequences.
///
/// `measure_index` addresses this measure in the part under construction;
/// span closes that land here may patch earlier measures via `spans`.
pub fn interpret_measure(
    measure: Node,
    measure_index: usize,
    divisions: u32,
    spans: &mut PartContext,
    ids: &mut IdFactory,
) -> PartMeasure {
    let mut state = MeasureState::new(measure_index, divisions);
    for token in token_stream(measure) {
        match token.kind {
            TokenKind::Note => state.apply_note(token.node, spans, ids),
            TokenKind::Direction => state.apply_direction(token.node, spans),
        }
    }
    state.finish()
}

struct MeasureState {
    index: usize,
    cursor: TimeCursor,
    /// First-seen order of voice labels fixes the output sequence order
    voices: Vec<VoiceState>,
    /// Beam level to the event ids accumulated so far
    open_beams: HashMap<u8, Vec<String>>,
    beams: Vec<Beam>,
}

impl MeasureState {
    fn new(index: usize, divisions: u32) -> Self {
        MeasureState {
            index,
            cursor: TimeCursor::new(divisions),
            voices: Vec::new(),
            open_beams: HashMap::new(),
            beams: Vec::new(),
        }
    }

    fn voice_index(&mut self, label: &str) -> usize {
        if let Some(index) = self.voices.iter().position(|v| v.voice == label) {
            return index;
        }
        self.voices.push(VoiceState::new(label.to_string()));
        self.voices.len() - 1
    }

    fn apply_note(&mut self, note: Node, spans: &mut PartContext, ids: &mut IdFactory) {
        let voice_label = parser::child_text(note, "voice").unwrap_or("1").to_string();
        let vi = self.voice_index(&voice_label);

        let is_rest = parser::child(note, "rest").is_some();
        let is_chord = !is_rest && parser::child(note, "chord").is_some();
        let value = parser::parse_note_value(note);

        if is_chord {
            match self.voices[vi].pending.as_mut() {
                Some(pending) => {
                    attach_note(pending, note, spans, ids);
                    decorate_event(pending, note, spans, ids);
                    return;
                }
                None => log::warn!("chord note without a current event, treating as a new event"),
            }
        }

        let grace = parser::child(note, "grace");
        let event_id = ids.mint("ev");
        let mut kept = false;
        {
            let voice = &mut self.voices[vi];
            voice.flush();
            let (starts, stops) = tuplet_marker_counts(note);
            if starts > 0 {
                let (inner, outer) = tuplet_ratio(note, value);
                for _ in 0..starts {
                    voice.push_tuplet(inner, outer);
                }
            }
            let mut event = Event::new(event_id.clone(), value);
            if is_rest {
                event.rest = Some(Rest {});
            }
            let mut pending = PendingEvent {
                event,
                grace: grace.is_some(),
                slash: grace.and_then(|g| g.attribute("slash").map(|v| v == "yes")),
                stops,
            };
            if !is_rest {
                attach_note(&mut pending, note, spans, ids);
            }
            if pending.event.rest.is_none() && pending.event.notes.is_empty() {
                log::warn!("note with neither readable pitch nor rest, skipped");
                for _ in 0..pending.stops {
                    voice.pop_tuplet();
                }
            } else {
                decorate_event(&mut pending, note, spans, ids);
                voice.pending = Some(pending);
                kept = true;
            }
        }
        if kept {
            self.apply_beam_markers(note, &event_id);
        }
        // chords share their owner's ticks, grace notes contribute none
        if grace.is_none() {
            if let Some(ticks) = parser::child_parse::<u64>(note, "duration") {
                self.cursor.advance(&voice_label, ticks);
            }
        }
    }

    fn apply_direction(&mut self, direction: Node, spans: &mut PartContext) {
        let voice_label = parser::child_text(direction, "voice")
            .unwrap_or("1")
            .to_string();
        let vi = self.voice_index(&voice_label);
        // the buffered event lands first so content order follows token order
        self.voices[vi].flush();
        let position = self.cursor.position(&voice_label);

        for direction_type in parser::children(direction, "direction-type") {
            for element in direction_type.children().filter(|n| n.is_element()) {
                match element.tag_name().name() {
                    "dynamics" => self.push_dynamics(vi, element, position),
                    "wedge" => self.apply_wedge(vi, element, position, spans),
                    "octave-shift" => self.apply_octave_shift(vi, element, position, spans),
                    "pedal" => self.apply_pedal(vi, element, position, spans),
                    _ => {}
                }
            }
        }
    }

    fn push_dynamics(&mut self, vi: usize, element: Node, position: RhythmicPosition) {
        for mark in element.children().filter(|n| n.is_element()) {
            let value = mark.tag_name().name().to_string();
            self.voices[vi]
                .top_content()
                .push(SequenceItem::Dynamic(Dynamic { value, position }));
        }
    }

    fn apply_wedge(
        &mut self,
        vi: usize,
        element: Node,
        position: RhythmicPosition,
        spans: &mut PartContext,
    ) {
        let number: u8 = parser::attr_parse(element, "number").unwrap_or(1);
        match element.attribute("type") {
            Some("crescendo") => self.start_wedge(vi, WedgeKind::Crescendo, position, number, spans),
            Some("diminuendo") => self.start_wedge(vi, WedgeKind::Diminuendo, position, number, spans),
            Some("stop") => spans.wedge_stop(
                number,
                SpanEnd {
                    measure: self.index,
                    position,
                },
            ),
            _ => {}
        }
    }

    fn start_wedge(
        &mut self,
        vi: usize,
        kind: WedgeKind,
        position: RhythmicPosition,
        number: u8,
        spans: &mut PartContext,
    ) {
        let locator = self.next_locator(vi);
        self.voices[vi].top_content().push(SequenceItem::Wedge(Wedge {
            kind,
            position,
            end: None,
        }));
        spans.wedge_start(number, locator);
    }

    fn apply_octave_shift(
        &mut self,
        vi: usize,
        element: Node,
        position: RhythmicPosition,
        spans: &mut PartContext,
    ) {
        let number: u8 = parser::attr_parse(element, "number").unwrap_or(1);
        match element.attribute("type") {
            // "down" writes the notes below their sound (8va family)
            Some("down") => self.start_octave_shift(vi, -shift_octaves(element), position, number, spans),
            Some("up") => self.start_octave_shift(vi, shift_octaves(element), position, number, spans),
            Some("stop") => spans.octave_shift_stop(
                number,
                SpanEnd {
                    measure: self.index,
                    position,
                },
            ),
            _ => {}
        }
    }

    fn start_octave_shift(
        &mut self,
        vi: usize,
        value: i8,
        position: RhythmicPosition,
        number: u8,
        spans: &mut PartContext,
    ) {
        let locator = self.next_locator(vi);
        self.voices[vi]
            .top_content()
            .push(SequenceItem::OctaveShift(OctaveShift {
                value,
                position,
                end: None,
            }));
        spans.octave_shift_start(number, locator);
    }

    fn apply_pedal(
        &mut self,
        vi: usize,
        element: Node,
        position: RhythmicPosition,
        spans: &mut PartContext,
    ) {
        let line_mode = parser::attr_is_yes(element, "line");
        match element.attribute("type") {
            Some("start") => {
                if line_mode {
                    self.start_pedal_line(vi, position, spans);
                } else {
                    self.voices[vi].top_content().push(SequenceItem::Pedal(Pedal {
                        kind: PedalKind::Down,
                        position,
                        end: None,
                    }));
                }
            }
            Some("stop") => {
                let end = SpanEnd {
                    measure: self.index,
                    position,
                };
                if !spans.pedal_close(end) {
                    // orphaned stop becomes a standalone release sign
                    self.voices[vi].top_content().push(SequenceItem::Pedal(Pedal {
                        kind: PedalKind::Release,
                        position,
                        end: None,
                    }));
                }
            }
            Some("change") => {
                let end = SpanEnd {
                    measure: self.index,
                    position,
                };
                if !spans.pedal_close(end) {
                    log::debug!("pedal change without an open line, opening one");
                }
                self.start_pedal_line(vi, position, spans);
            }
            _ => {}
        }
    }

    fn start_pedal_line(&mut self, vi: usize, position: RhythmicPosition, spans: &mut PartContext) {
        let locator = self.next_locator(vi);
        self.voices[vi].top_content().push(SequenceItem::Pedal(Pedal {
            kind: PedalKind::Line,
            position,
            end: None,
        }));
        spans.pedal_open(locator);
    }

    fn apply_beam_markers(&mut self, note: Node, event_id: &str) {
        for beam in parser::children(note, "beam") {
            let level: u8 = parser::attr_parse(beam, "number").unwrap_or(1);
            match beam.text().map(str::trim) {
                Some("begin") => {
                    self.open_beams.insert(level, vec![event_id.to_string()]);
                }
                Some("continue") => match self.open_beams.get_mut(&level) {
                    Some(events) => events.push(event_id.to_string()),
                    None => {
                        log::debug!("beam continue without begin at level {}", level);
                        self.open_beams.insert(level, vec![event_id.to_string()]);
                    }
                },
                Some("end") => match self.open_beams.remove(&level) {
                    Some(mut events) => {
                        events.push(event_id.to_string());
                        self.beams.push(Beam { events });
                    }
                    None => log::debug!("beam end without begin at level {}, dropped", level),
                },
                _ => {} // hooks and unknown values
            }
        }
    }

    /// Address of the next item pushed to this voice's current container
    fn next_locator(&self, vi: usize) -> ContentLocator {
        ContentLocator {
            measure: self.index,
            sequence: vi,
            path: self.voices[vi].next_item_path(),
        }
    }

    fn finish(self) -> PartMeasure {
        if !self.open_beams.is_empty() {
            log::debug!(
                "measure ended with {} unterminated beam(s), discarded",
                self.open_beams.len()
            );
        }
        let sequences = self.voices.into_iter().map(VoiceState::finish).collect();
        PartMeasure {
            sequences,
            beams: self.beams,
        }
    }
}

/// Event under construction, buffered so chord members can still attach
struct PendingEvent {
    event: Event,
    grace: bool,
    slash: Option<bool>,
    /// Tuplet frames to pop once this event has landed
    stops: u8,
}

/// An open tuplet: collects content until its stop marker folds it
struct TupletFrame {
    inner: TupletPortion,
    outer: TupletPortion,
    content: Vec<SequenceItem>,
}

struct VoiceState {
    voice: String,
    root: Vec<SequenceItem>,
    /// Innermost frame last; the root list is separate and never popped
    open_tuplets: Vec<TupletFrame>,
    pending: Option<PendingEvent>,
}

impl VoiceState {
    fn new(voice: String) -> Self {
        VoiceState {
            voice,
            root: Vec::new(),
            open_tuplets: Vec::new(),
            pending: None,
        }
    }

    fn top_content(&mut self) -> &mut Vec<SequenceItem> {
        match self.open_tuplets.last_mut() {
            Some(frame) => &mut frame.content,
            None => &mut self.root,
        }
    }

    /// Content indices, root outward, of where the next item will land.
    /// Parent lists cannot grow while an inner frame is open, so these
    /// stay valid until the addressed item exists.
    fn next_item_path(&self) -> Vec<usize> {
        let mut path = Vec::with_capacity(self.open_tuplets.len() + 1);
        let mut content = &self.root;
        for frame in &self.open_tuplets {
            path.push(content.len());
            content = &frame.content;
        }
        path.push(content.len());
        path
    }

    fn push_tuplet(&mut self, inner: TupletPortion, outer: TupletPortion) {
        self.open_tuplets.push(TupletFrame {
            inner,
            outer,
            content: Vec::new(),
        });
    }

    /// Fold the innermost open tuplet into its parent as a finished item
    fn pop_tuplet(&mut self) {
        match self.open_tuplets.pop() {
            Some(frame) => {
                let item = SequenceItem::Tuplet(Tuplet {
                    inner: frame.inner,
                    outer: frame.outer,
                    content: frame.content,
                });
                self.top_content().push(item);
            }
            None => log::debug!("tuplet stop without an open tuplet, ignored"),
        }
    }

    /// Land the buffered event, then perform its deferred tuplet pops
    fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let item = SequenceItem::Event(pending.event);
            if pending.grace {
                // consecutive grace notes collect into one group
                let content = self.top_content();
                match content.last_mut() {
                    Some(SequenceItem::Grace(group)) => group.content.push(item),
                    _ => content.push(SequenceItem::Grace(GraceGroup {
                        slash: pending.slash,
                        content: vec![item],
                    })),
                }
            } else {
                self.top_content().push(item);
            }
            for _ in 0..pending.stops {
                self.pop_tuplet();
            }
        }
    }

    fn finish(mut self) -> Sequence {
        self.flush();
        if !self.open_tuplets.is_empty() {
            log::debug!(
                "measure ended with {} open tuplet(s), closed at the barline",
                self.open_tuplets.len()
            );
        }
        while !self.open_tuplets.is_empty() {
            self.pop_tuplet();
        }
        Sequence {
            voice: self.voice,
            content: self.root,
        }
    }
}

/// Build the note payload of a note token: pitch or unpitched content,
/// accidental display flags, notehead shape
fn build_note(note: Node, ids: &mut IdFactory) -> Option<Note> {
    let content = parser::child(note, "pitch")
        .and_then(parser::parse_pitch)
        .map(NoteContent::Pitch)
        .or_else(|| {
            parser::child(note, "unpitched")
                .and_then(parser::parse_unpitched)
                .map(NoteContent::Unpitched)
        })?;
    let mut built = Note::new(ids.mint("note"), content);
    if let Some(accidental) = parser::child(note, "accidental") {
        built.accidental_display = Some(AccidentalDisplay {
            show: true,
            cautionary: parser::attr_is_yes(accidental, "parentheses"),
            editorial: parser::attr_is_yes(accidental, "editorial"),
        });
    }
    if let Some(shape) = parser::child_text(note, "notehead") {
        match Notehead::from_keyword(shape) {
            Some(notehead) => built.notehead = Some(notehead),
            None => log::debug!("notehead '{}' outside the accepted set, dropped", shape),
        }
    }
    Some(built)
}

/// Add one note token's notehead payload and tie markers to the event
/// under construction
fn attach_note(pending: &mut PendingEvent, note: Node, spans: &mut PartContext, ids: &mut IdFactory) {
    if let Some(built) = build_note(note, ids) {
        let key = pitch_key(&built.content);
        let note_id = built.id.clone();
        pending.event.notes.push(built);
        apply_tie_markers(note, &key, &note_id, spans);
    }
}

fn pitch_key(content: &NoteContent) -> String {
    match content {
        NoteContent::Pitch(pitch) => format!("{}{}", pitch.step.as_str(), pitch.octave),
        NoteContent::Unpitched(unpitched) => {
            format!("{}{}", unpitched.step.as_str(), unpitched.octave)
        }
    }
}

/// Ties are read from the notation-layer `<tied>` element, which carries
/// the optional `number` key; the sound-layer `<tie>` duplicate is
/// ignored. Unnumbered ties key on the note's step+octave string.
fn apply_tie_markers(note: Node, pitch_key: &str, note_id: &str, spans: &mut PartContext) {
    for notations in parser::children(note, "notations") {
        for tied in parser::children(notations, "tied") {
            let key = tied
                .attribute("number")
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| pitch_key.to_string());
            match tied.attribute("type") {
                Some("start") => spans.tie_start(key, note_id.to_string()),
                Some("stop") => spans.tie_stop(&key, note_id),
                _ => {}
            }
        }
    }
}

/// Event-scoped notations and lyrics of one note token. Chord members
/// contribute to the shared event; duplicates across notation blocks are
/// kept as they come.
fn decorate_event(
    pending: &mut PendingEvent,
    note: Node,
    spans: &mut PartContext,
    ids: &mut IdFactory,
) {
    let event_id = pending.event.id.clone();
    for notations in parser::children(note, "notations") {
        for block in parser::children(notations, "articulations") {
            for mark in block.children().filter(|n| n.is_element()) {
                match Articulation::from_keyword(mark.tag_name().name()) {
                    Some(articulation) => pending.event.articulations.push(articulation),
                    None => log::debug!(
                        "articulation '{}' not recognized, dropped",
                        mark.tag_name().name()
                    ),
                }
            }
        }
        for _ in parser::children(notations, "fermata") {
            pending.event.articulations.push(Articulation::Fermata);
        }
        for slur in parser::children(notations, "slur") {
            let number: u8 = parser::attr_parse(slur, "number").unwrap_or(1);
            match slur.attribute("type") {
                Some("start") => spans.slur_start(number, event_id.clone()),
                Some("stop") => {
                    // the stop marker's placement decides the side
                    let side = slur.attribute("placement").and_then(SlurSide::from_placement);
                    spans.slur_stop(number, &event_id, side);
                }
                _ => {}
            }
        }
        for ornaments in parser::children(notations, "ornaments") {
            for tremolo in parser::children(ornaments, "tremolo") {
                apply_tremolo(pending, tremolo, spans, ids);
            }
        }
    }
    for lyric in parser::children(note, "lyric") {
        if let Some(text) = parser::child_text(lyric, "text") {
            let verse = lyric.attribute("number").unwrap_or("1");
            let line = spans.lyric_line_id(ids, verse, lyric.attribute("name"));
            pending.event.lyrics.push(Lyric {
                text: text.to_string(),
                syllabic: parser::child_text(lyric, "syllabic").and_then(Syllabic::from_name),
                line: Some(line),
            });
        }
    }
}

fn apply_tremolo(
    pending: &mut PendingEvent,
    tremolo: Node,
    spans: &mut PartContext,
    ids: &mut IdFactory,
) {
    match tremolo.attribute("type").unwrap_or("single") {
        "single" => {
            let marks = tremolo
                .text()
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(3);
            pending.event.tremolo = Some(Tremolo::Single { marks });
        }
        "start" => {
            let id = ids.mint("trem");
            spans.tremolo_start(id.clone());
            pending.event.tremolo = Some(Tremolo::Multi { id });
        }
        "stop" => match spans.tremolo_stop() {
            Some(id) => pending.event.tremolo = Some(Tremolo::Multi { id }),
            None => log::debug!("tremolo stop without an active tremolo, dropped"),
        },
        other => log::debug!("tremolo type '{}' not recognized, dropped", other),
    }
}

fn tuplet_marker_counts(note: Node) -> (u8, u8) {
    let mut starts = 0;
    let mut stops = 0;
    for notations in parser::children(note, "notations") {
        for tuplet in parser::children(notations, "tuplet") {
            match tuplet.attribute("type") {
                Some("start") => starts += 1,
                Some("stop") => stops += 1,
                _ => {}
            }
        }
    }
    (starts, stops)
}

/// Tuplet ratio from the note's time-modification: `inner.multiple` units
/// in the written time of `outer.multiple`. The unit is the note's own
/// base value unless a normal-type overrides the outer side.
fn tuplet_ratio(note: Node, value: NoteValue) -> (TupletPortion, TupletPortion) {
    let inner_unit = NoteValue::new(value.base);
    match parser::child(note, "time-modification") {
        Some(modification) => {
            let actual: u32 = parser::child_parse(modification, "actual-notes")
                .filter(|n| *n > 0)
                .unwrap_or(3);
            let normal: u32 = parser::child_parse(modification, "normal-notes")
                .filter(|n| *n > 0)
                .unwrap_or(2);
            let outer_unit = match parser::child_text(modification, "normal-type")
                .and_then(DurationBase::from_name)
            {
                Some(base) => NoteValue {
                    base,
                    dots: parser::children(modification, "normal-dot").count() as u8,
                },
                None => inner_unit,
            };
            (
                TupletPortion {
                    duration: inner_unit,
                    multiple: actual,
                },
                TupletPortion {
                    duration: outer_unit,
                    multiple: normal,
                },
            )
        }
        None => {
            log::debug!("tuplet start without time-modification, assuming 3:2");
            (
                TupletPortion {
                    duration: inner_unit,
                    multiple: 3,
                },
                TupletPortion {
                    duration: inner_unit,
                    multiple: 2,
                },
            )
        }
    }
}

fn shift_octaves(element: Node) -> i8 {
    match parser::attr_parse::<u32>(element, "size").unwrap_or(8) {
        8 => 1,
        15 => 2,
        22 => 3,
        other => {
            log::warn!("octave-shift size {} not recognized, assuming one octave", other);
            1
        }
    }
}
