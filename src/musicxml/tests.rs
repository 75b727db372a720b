//! Unit tests for MusicXML conversion

use super::*;
use crate::errors::ScoreError;
use crate::models::{
    Articulation, DurationBase, Fraction, Score, SequenceItem, Syllabic, WedgeKind,
};

fn convert(xml: &str) -> Score {
    parse_musicxml(xml).expect("conversion should succeed")
}

#[test]
fn test_parse_simple_melody() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>4</divisions>
        <key><fifths>0</fifths></key>
        <time><beats>4</beats><beat-type>4</beat-type></time>
      </attributes>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>4</duration>
        <type>quarter</type>
      </note>
      <note>
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>4</duration>
        <type>quarter</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    assert_eq!(score.mnx.version, 1);
    assert_eq!(score.global.measures.len(), 1);
    let global = &score.global.measures[0];
    assert_eq!(global.time.map(|t| (t.count, t.unit)), Some((4, 4)));
    assert_eq!(global.key.map(|k| k.fifths), Some(0));

    assert_eq!(score.parts.len(), 1);
    let part = &score.parts[0];
    assert_eq!(part.id.as_deref(), Some("P1"));
    assert_eq!(part.name.as_deref(), Some("Piano"));
    assert_eq!(part.measures.len(), 1);

    let sequences = &part.measures[0].sequences;
    assert_eq!(sequences.len(), 1);
    assert_eq!(sequences[0].voice, "1");
    assert_eq!(sequences[0].content.len(), 2);

    if let SequenceItem::Event(event) = &sequences[0].content[0] {
        assert_eq!(event.id, "ev1");
        assert_eq!(event.duration.base, DurationBase::Quarter);
        assert_eq!(event.notes.len(), 1);
        assert_eq!(event.notes[0].id, "note1");
    } else {
        panic!("Expected Event item");
    }
    if let SequenceItem::Event(event) = &sequences[0].content[1] {
        assert_eq!(event.id, "ev2");
        assert_eq!(event.notes[0].id, "note2");
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_rejects_timewise_root() {
    let musicxml = r#"<?xml version="1.0"?>
<score-timewise version="3.1">
  <part-list/>
</score-timewise>"#;

    match parse_musicxml(musicxml) {
        Err(ScoreError::UnsupportedRoot(root)) => assert_eq!(root, "score-timewise"),
        other => panic!("Expected UnsupportedRoot error, got {:?}", other),
    }
}

#[test]
fn test_rejects_malformed_xml() {
    let result = parse_musicxml("<score-partwise><part></score-partwise>");
    assert!(matches!(result, Err(ScoreError::InvalidXml(_))));
}

#[test]
fn test_accepts_doctype_header() {
    let musicxml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Flute</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1"/>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    assert_eq!(score.parts.len(), 1);
    assert!(score.parts[0].measures[0].sequences.is_empty());
}

#[test]
fn test_chord_notes_share_one_event() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note default-x="10">
        <pitch><step>A</step><octave>4</octave></pitch>
        <duration>2</duration>
        <voice>1</voice>
        <type>half</type>
      </note>
      <note default-x="10">
        <chord/>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>2</duration>
        <voice>1</voice>
        <type>half</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert_eq!(content.len(), 1);
    if let SequenceItem::Event(event) = &content[0] {
        assert_eq!(event.duration.base, DurationBase::Half);
        assert_eq!(event.notes.len(), 2);
        assert_eq!(event.notes[0].id, "note1");
        assert_eq!(event.notes[1].id, "note2");
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_triplet_builds_tuplet_container() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>3</divisions></attributes>
      <note default-x="10">
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
        <notations><tuplet type="start"/></notations>
      </note>
      <note default-x="20">
        <pitch><step>E</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
      </note>
      <note default-x="30">
        <pitch><step>F</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>eighth</type>
        <time-modification><actual-notes>3</actual-notes><normal-notes>2</normal-notes></time-modification>
        <notations><tuplet type="stop"/></notations>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert_eq!(content.len(), 1, "tuplet should be the only root item");
    if let SequenceItem::Tuplet(tuplet) = &content[0] {
        assert_eq!(tuplet.inner.multiple, 3);
        assert_eq!(tuplet.inner.duration.base, DurationBase::Eighth);
        assert_eq!(tuplet.outer.multiple, 2);
        assert_eq!(tuplet.content.len(), 3);
        for item in &tuplet.content {
            assert!(matches!(item, SequenceItem::Event(_)));
        }
    } else {
        panic!("Expected Tuplet item");
    }
}

#[test]
fn test_direction_sorts_before_note_at_equal_position() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <note default-x="20">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
      <direction default-x="20">
        <direction-type><dynamics><p/></dynamics></direction-type>
      </direction>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert_eq!(content.len(), 2);
    assert!(
        matches!(&content[0], SequenceItem::Dynamic(d) if d.value == "p"),
        "direction should precede the note at the same position"
    );
    assert!(matches!(&content[1], SequenceItem::Event(_)));
}

#[test]
fn test_tokens_order_by_position() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <direction default-x="10">
        <direction-type><dynamics><p/></dynamics></direction-type>
      </direction>
      <note default-x="20">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert!(matches!(&content[0], SequenceItem::Dynamic(_)));
    if let SequenceItem::Dynamic(dynamic) = &content[0] {
        assert_eq!(dynamic.position.fraction, Fraction::new(0, 4));
    }
    assert!(matches!(&content[1], SequenceItem::Event(_)));
}

#[test]
fn test_wedge_start_and_stop_positions() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note default-x="10">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>quarter</type>
      </note>
      <direction default-x="20">
        <direction-type><wedge type="crescendo"/></direction-type>
      </direction>
      <note default-x="30">
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>quarter</type>
      </note>
      <direction default-x="40">
        <direction-type><wedge type="stop"/></direction-type>
      </direction>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert_eq!(content.len(), 3);
    if let SequenceItem::Wedge(wedge) = &content[1] {
        assert_eq!(wedge.kind, WedgeKind::Crescendo);
        assert_eq!(wedge.position.fraction, Fraction::new(2, 8));
        let end = wedge.end.expect("wedge should be closed");
        assert_eq!(end.measure, 0);
        assert_eq!(end.position.fraction, Fraction::new(4, 8));
    } else {
        panic!("Expected Wedge item");
    }
}

#[test]
fn test_grace_notes_contribute_zero_ticks() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note default-x="10">
        <grace slash="yes"/>
        <pitch><step>D</step><octave>5</octave></pitch>
        <type>eighth</type>
      </note>
      <note default-x="20">
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>4</duration>
        <type>whole</type>
      </note>
      <direction default-x="30">
        <direction-type><wedge type="crescendo"/></direction-type>
      </direction>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    assert_eq!(content.len(), 3);
    if let SequenceItem::Grace(group) = &content[0] {
        assert_eq!(group.slash, Some(true));
        assert_eq!(group.content.len(), 1);
        if let SequenceItem::Event(event) = &group.content[0] {
            assert_eq!(event.duration.base, DurationBase::Eighth);
        } else {
            panic!("Expected Event inside grace group");
        }
    } else {
        panic!("Expected Grace item");
    }
    // the wedge lands exactly one whole note in: the grace added nothing
    if let SequenceItem::Wedge(wedge) = &content[2] {
        assert_eq!(wedge.position.fraction, Fraction::new(4, 4));
    } else {
        panic!("Expected Wedge item");
    }
}

#[test]
fn test_voices_build_independent_sequences() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Organ</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note default-x="10">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>2</duration>
        <voice>1</voice>
        <type>quarter</type>
      </note>
      <note default-x="15">
        <pitch><step>E</step><octave>3</octave></pitch>
        <duration>8</duration>
        <voice>2</voice>
        <type>whole</type>
      </note>
      <note default-x="20">
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>2</duration>
        <voice>1</voice>
        <type>quarter</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let sequences = &score.parts[0].measures[0].sequences;
    assert_eq!(sequences.len(), 2);
    assert_eq!(sequences[0].voice, "1");
    assert_eq!(sequences[0].content.len(), 2);
    assert_eq!(sequences[1].voice, "2");
    assert_eq!(sequences[1].content.len(), 1);
}

#[test]
fn test_divisions_persist_until_changed() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>2</divisions></attributes>
      <note default-x="10">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>quarter</type>
      </note>
    </measure>
    <measure number="2">
      <note default-x="10">
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>2</duration>
        <type>quarter</type>
      </note>
      <direction default-x="20">
        <direction-type><wedge type="crescendo"/></direction-type>
      </direction>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[1].sequences[0].content;
    if let SequenceItem::Wedge(wedge) = &content[1] {
        // denominator still reflects divisions=2 from the first measure
        assert_eq!(wedge.position.fraction, Fraction::new(2, 8));
        assert_eq!(wedge.end, None);
    } else {
        panic!("Expected Wedge item");
    }
}

#[test]
fn test_global_measures_come_from_first_part() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Flute</part-name></score-part>
    <score-part id="P2"><part-name>Oboe</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>1</divisions>
        <time><beats>3</beats><beat-type>4</beat-type></time>
      </attributes>
    </measure>
    <measure number="2">
      <barline location="right"><bar-style>light-heavy</bar-style></barline>
    </measure>
  </part>
  <part id="P2">
    <measure number="1"/>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    assert_eq!(score.global.measures.len(), 2);
    assert_eq!(
        score.global.measures[0].time.map(|t| (t.count, t.unit)),
        Some((3, 4))
    );
    assert!(score.global.measures[0].barline.is_none());
    assert!(score.global.measures[1].barline.is_some());
    assert_eq!(score.parts.len(), 2);
    assert_eq!(score.parts[1].name.as_deref(), Some("Oboe"));
    assert_eq!(score.parts[1].measures.len(), 1);
}

#[test]
fn test_lyrics_register_part_lines() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Voice</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note default-x="10">
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <lyric number="1"><syllabic>begin</syllabic><text>hel</text></lyric>
      </note>
      <note default-x="20">
        <pitch><step>D</step><octave>4</octave></pitch>
        <duration>1</duration>
        <type>quarter</type>
        <lyric number="1"><syllabic>end</syllabic><text>lo</text></lyric>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let part = &score.parts[0];
    assert_eq!(part.lyric_lines.len(), 1);
    assert_eq!(part.lyric_lines[0].id, "lyric1");

    let content = &part.measures[0].sequences[0].content;
    if let SequenceItem::Event(event) = &content[0] {
        assert_eq!(event.lyrics.len(), 1);
        assert_eq!(event.lyrics[0].text, "hel");
        assert_eq!(event.lyrics[0].syllabic, Some(Syllabic::Begin));
        assert_eq!(event.lyrics[0].line.as_deref(), Some("lyric1"));
    } else {
        panic!("Expected Event item");
    }
    if let SequenceItem::Event(event) = &content[1] {
        assert_eq!(event.lyrics[0].text, "lo");
        assert_eq!(event.lyrics[0].syllabic, Some(Syllabic::End));
        assert_eq!(event.lyrics[0].line.as_deref(), Some("lyric1"));
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_rest_becomes_rest_event() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note default-x="10">
        <rest/>
        <duration>2</duration>
        <type>half</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    if let SequenceItem::Event(event) = &content[0] {
        assert!(event.rest.is_some());
        assert!(event.notes.is_empty());
        assert_eq!(event.duration.base, DurationBase::Half);
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_missing_type_defaults_to_quarter() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <note default-x="10">
        <pitch><step>G</step><octave>4</octave></pitch>
        <duration>1</duration>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    if let SequenceItem::Event(event) = &content[0] {
        assert_eq!(event.duration.base, DurationBase::Quarter);
        assert_eq!(event.duration.dots, 0);
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_512th_and_1024th_types_convert() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>256</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>5</octave></pitch>
        <duration>2</duration>
        <type>512th</type>
      </note>
      <note>
        <pitch><step>D</step><octave>5</octave></pitch>
        <duration>1</duration>
        <type>1024th</type>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    if let SequenceItem::Event(event) = &content[0] {
        assert_eq!(event.duration.base, DurationBase::FiveTwelfth);
    } else {
        panic!("Expected Event item");
    }
    if let SequenceItem::Event(event) = &content[1] {
        assert_eq!(event.duration.base, DurationBase::TenTwentyFourth);
    } else {
        panic!("Expected Event item");
    }
}

#[test]
fn test_articulations_flatten_across_notation_blocks() {
    let musicxml = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note>
        <pitch><step>C</step><octave>4</octave></pitch>
        <duration>4</duration>
        <type>whole</type>
        <notations>
          <articulations><staccato/></articulations>
        </notations>
        <notations>
          <articulations><staccato/></articulations>
          <fermata/>
        </notations>
      </note>
    </measure>
  </part>
</score-partwise>"#;

    let score = convert(musicxml);
    let content = &score.parts[0].measures[0].sequences[0].content;
    if let SequenceItem::Event(event) = &content[0] {
        assert_eq!(
            event.articulations,
            vec![
                Articulation::Staccato,
                Articulation::Staccato,
                Articulation::Fermata
            ],
            "both notation blocks should contribute, duplicates included"
        );
    } else {
        panic!("Expected Event item");
    }
}
