//! Part-scoped span state
//!
//! Ties, slurs, wedges, octave shifts, pedal lines and multi-note tremolos
//! may close in a later measure than they open, so their open ends live
//! here, outside any single measure interpreter. Closing happens in two
//! steps: markers record a fixup (an address plus an end position), and
//! the fixups are patched into the already-built measures afterwards.
//! Start markers that reuse a still-open key silently supersede the old
//! span; stop markers without a matching start are dropped.

use std::collections::HashMap;

use crate::ids::IdFactory;
use crate::models::{LyricLine, PartMeasure, SequenceItem, Slur, SlurSide, SpanEnd, Tie};

/// Address of one content item inside a part under construction: measure
/// index, sequence index, then one content index per nesting level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLocator {
    pub measure: usize,
    pub sequence: usize,
    pub path: Vec<usize>,
}

/// A span close waiting to be patched onto the item at `locator`
#[derive(Debug)]
struct EndFixup {
    locator: ContentLocator,
    end: SpanEnd,
}

/// State shared by every measure interpreter of one part
#[derive(Debug, Default)]
pub struct PartContext {
    /// Tie key (explicit number, else step+octave) to source note id
    open_ties: HashMap<String, String>,
    /// Slur number to source event id
    open_slurs: HashMap<u8, String>,
    open_wedges: HashMap<u8, ContentLocator>,
    open_octave_shifts: HashMap<u8, ContentLocator>,
    open_pedal: Option<ContentLocator>,
    /// Single slot: one concurrent multi-note tremolo per part
    active_tremolo: Option<String>,
    lyric_lines: Vec<LyricLine>,
    lyric_ids_by_verse: HashMap<String, String>,
    end_fixups: Vec<EndFixup>,
    /// Source event id to slur descriptors, attached once the part is done
    pending_slurs: HashMap<String, Vec<Slur>>,
    /// Source note id to tie descriptors, attached once the part is done
    pending_ties: HashMap<String, Vec<Tie>>,
}

impl PartContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tie_start(&mut self, key: String, source_note: String) {
        self.open_ties.insert(key, source_note);
    }

    pub fn tie_stop(&mut self, key: &str, target_note: &str) {
        match self.open_ties.remove(key) {
            Some(source) => {
                self.pending_ties.entry(source).or_default().push(Tie {
                    target: target_note.to_string(),
                });
            }
            None => log::debug!("tie stop '{}' without an open tie, dropped", key),
        }
    }

    pub fn slur_start(&mut self, number: u8, source_event: String) {
        self.open_slurs.insert(number, source_event);
    }

    pub fn slur_stop(&mut self, number: u8, target_event: &str, side: Option<SlurSide>) {
        match self.open_slurs.remove(&number) {
            Some(source) => {
                self.pending_slurs.entry(source).or_default().push(Slur {
                    target: target_event.to_string(),
                    side,
                });
            }
            None => log::debug!("slur stop {} without an open slur, dropped", number),
        }
    }

    pub fn wedge_start(&mut self, number: u8, locator: ContentLocator) {
        self.open_wedges.insert(number, locator);
    }

    pub fn wedge_stop(&mut self, number: u8, end: SpanEnd) {
        match self.open_wedges.remove(&number) {
            Some(locator) => self.end_fixups.push(EndFixup { locator, end }),
            None => log::debug!("wedge stop {} without an open wedge, dropped", number),
        }
    }

    pub fn octave_shift_start(&mut self, number: u8, locator: ContentLocator) {
        self.open_octave_shifts.insert(number, locator);
    }

    pub fn octave_shift_stop(&mut self, number: u8, end: SpanEnd) {
        match self.open_octave_shifts.remove(&number) {
            Some(locator) => self.end_fixups.push(EndFixup { locator, end }),
            None => log::debug!("octave-shift stop {} without an open shift, dropped", number),
        }
    }

    pub fn pedal_open(&mut self, locator: ContentLocator) {
        self.open_pedal = Some(locator);
    }

    /// Close the open pedal line, if any. Returns false when there was
    /// nothing to close, so the caller can emit a standalone release.
    pub fn pedal_close(&mut self, end: SpanEnd) -> bool {
        match self.open_pedal.take() {
            Some(locator) => {
                self.end_fixups.push(EndFixup { locator, end });
                true
            }
            None => false,
        }
    }

    pub fn tremolo_start(&mut self, id: String) {
        if self.active_tremolo.replace(id).is_some() {
            log::debug!("tremolo start while another is active, slot replaced");
        }
    }

    pub fn tremolo_stop(&mut self) -> Option<String> {
        self.active_tremolo.take()
    }

    /// Id of the lyric line for a verse number, registering the line with
    /// its display label on first sight
    pub fn lyric_line_id(&mut self, ids: &mut IdFactory, verse: &str, label: Option<&str>) -> String {
        if let Some(id) = self.lyric_ids_by_verse.get(verse) {
            return id.clone();
        }
        let id = ids.mint("lyric");
        self.lyric_lines.push(LyricLine {
            id: id.clone(),
            label: label.unwrap_or(verse).to_string(),
        });
        self.lyric_ids_by_verse.insert(verse.to_string(), id.clone());
        id
    }

    pub fn take_lyric_lines(&mut self) -> Vec<LyricLine> {
        std::mem::take(&mut self.lyric_lines)
    }

    /// Patch recorded span closes into the measures built so far. Called
    /// after each measure, once its items have a fixed address.
    pub fn apply_end_fixups(&mut self, measures: &mut [PartMeasure]) {
        for fixup in self.end_fixups.drain(..) {
            match locate_item(measures, &fixup.locator) {
                Some(SequenceItem::Wedge(wedge)) => wedge.end = Some(fixup.end),
                Some(SequenceItem::OctaveShift(shift)) => shift.end = Some(fixup.end),
                Some(SequenceItem::Pedal(pedal)) => pedal.end = Some(fixup.end),
                _ => log::warn!(
                    "span close in measure {} does not address a span item",
                    fixup.end.measure
                ),
            }
        }
    }

    /// Attach completed slur and tie descriptors onto their source events
    /// and notes. Called once per part, after the last measure.
    pub fn resolve_pending(&mut self, measures: &mut [PartMeasure]) {
        if self.pending_slurs.is_empty() && self.pending_ties.is_empty() {
            return;
        }
        for measure in measures.iter_mut() {
            for sequence in &mut measure.sequences {
                resolve_content(
                    &mut sequence.content,
                    &mut self.pending_slurs,
                    &mut self.pending_ties,
                );
            }
        }
        for (source, slurs) in self.pending_slurs.drain() {
            log::warn!("slur source event {} not found, {} slur(s) dropped", source, slurs.len());
        }
        for (source, ties) in self.pending_ties.drain() {
            log::warn!("tie source note {} not found, {} tie(s) dropped", source, ties.len());
        }
    }
}

fn resolve_content(
    content: &mut [SequenceItem],
    slurs: &mut HashMap<String, Vec<Slur>>,
    ties: &mut HashMap<String, Vec<Tie>>,
) {
    for item in content.iter_mut() {
        match item {
            SequenceItem::Event(event) => {
                if let Some(list) = slurs.remove(&event.id) {
                    event.slurs.extend(list);
                }
                for note in &mut event.notes {
                    if let Some(list) = ties.remove(&note.id) {
                        note.ties.extend(list);
                    }
                }
            }
            SequenceItem::Tuplet(tuplet) => resolve_content(&mut tuplet.content, slurs, ties),
            SequenceItem::Grace(group) => resolve_content(&mut group.content, slurs, ties),
            _ => {}
        }
    }
}

fn locate_item<'m>(
    measures: &'m mut [PartMeasure],
    locator: &ContentLocator,
) -> Option<&'m mut SequenceItem> {
    let sequence = measures
        .get_mut(locator.measure)?
        .sequences
        .get_mut(locator.sequence)?;
    let mut content = &mut sequence.content;
    let (last, nested) = locator.path.split_last()?;
    for &index in nested {
        content = match content.get_mut(index)? {
            SequenceItem::Tuplet(tuplet) => &mut tuplet.content,
            SequenceItem::Grace(group) => &mut group.content,
            _ => return None,
        };
    }
    content.get_mut(*last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DurationBase, Event, Fraction, NoteValue, RhythmicPosition, Sequence, Wedge, WedgeKind,
    };

    fn wedge_at(numerator: u64) -> SequenceItem {
        SequenceItem::Wedge(Wedge {
            kind: WedgeKind::Crescendo,
            position: RhythmicPosition {
                fraction: Fraction::new(numerator, 8),
            },
            end: None,
        })
    }

    #[test]
    fn test_wedge_close_patches_earlier_measure() {
        let mut spans = PartContext::new();
        let mut measures = vec![PartMeasure {
            sequences: vec![Sequence {
                voice: "1".to_string(),
                content: vec![wedge_at(0)],
            }],
            beams: Vec::new(),
        }];
        spans.wedge_start(
            1,
            ContentLocator {
                measure: 0,
                sequence: 0,
                path: vec![0],
            },
        );
        let end = SpanEnd {
            measure: 1,
            position: RhythmicPosition {
                fraction: Fraction::new(4, 8),
            },
        };
        spans.wedge_stop(1, end);
        spans.apply_end_fixups(&mut measures);

        match &measures[0].sequences[0].content[0] {
            SequenceItem::Wedge(wedge) => assert_eq!(wedge.end, Some(end)),
            other => panic!("Expected Wedge item, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_wedge_stop_is_dropped() {
        let mut spans = PartContext::new();
        let mut measures: Vec<PartMeasure> = Vec::new();
        spans.wedge_stop(
            1,
            SpanEnd {
                measure: 0,
                position: RhythmicPosition {
                    fraction: Fraction::new(0, 4),
                },
            },
        );
        spans.apply_end_fixups(&mut measures);
        assert!(measures.is_empty());
    }

    #[test]
    fn test_reused_wedge_number_supersedes() {
        let mut spans = PartContext::new();
        let mut measures = vec![PartMeasure {
            sequences: vec![Sequence {
                voice: "1".to_string(),
                content: vec![wedge_at(0), wedge_at(2)],
            }],
            beams: Vec::new(),
        }];
        spans.wedge_start(
            1,
            ContentLocator {
                measure: 0,
                sequence: 0,
                path: vec![0],
            },
        );
        // same number opens again before the first one closes
        spans.wedge_start(
            1,
            ContentLocator {
                measure: 0,
                sequence: 0,
                path: vec![1],
            },
        );
        let end = SpanEnd {
            measure: 0,
            position: RhythmicPosition {
                fraction: Fraction::new(4, 8),
            },
        };
        spans.wedge_stop(1, end);
        spans.apply_end_fixups(&mut measures);

        match &measures[0].sequences[0].content[0] {
            SequenceItem::Wedge(wedge) => assert_eq!(wedge.end, None),
            other => panic!("Expected Wedge item, got {:?}", other),
        }
        match &measures[0].sequences[0].content[1] {
            SequenceItem::Wedge(wedge) => assert_eq!(wedge.end, Some(end)),
            other => panic!("Expected Wedge item, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_pair_resolves_onto_source_note() {
        let mut spans = PartContext::new();
        spans.tie_start("C4".to_string(), "note1".to_string());
        spans.tie_stop("C4", "note2");

        let mut event = Event::new("ev1".to_string(), NoteValue::new(DurationBase::Half));
        event.notes.push(crate::models::Note::new(
            "note1".to_string(),
            crate::models::NoteContent::Pitch(crate::models::Pitch {
                step: crate::models::Step::C,
                octave: 4,
                alter: None,
            }),
        ));
        let mut measures = vec![PartMeasure {
            sequences: vec![Sequence {
                voice: "1".to_string(),
                content: vec![SequenceItem::Event(event)],
            }],
            beams: Vec::new(),
        }];
        spans.resolve_pending(&mut measures);

        match &measures[0].sequences[0].content[0] {
            SequenceItem::Event(event) => {
                assert_eq!(event.notes[0].ties.len(), 1);
                assert_eq!(event.notes[0].ties[0].target, "note2");
            }
            other => panic!("Expected Event item, got {:?}", other),
        }
    }

    #[test]
    fn test_lyric_lines_register_once_per_verse() {
        let mut spans = PartContext::new();
        let mut ids = IdFactory::new();
        let first = spans.lyric_line_id(&mut ids, "1", None);
        let again = spans.lyric_line_id(&mut ids, "1", None);
        let second = spans.lyric_line_id(&mut ids, "2", Some("chorus"));
        assert_eq!(first, again);
        assert_ne!(first, second);

        let lines = spans.take_lyric_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "1");
        assert_eq!(lines[1].label, "chorus");
    }
}
