//! MusicXML to score model conversion
//!
//! The entry point is [`parse_musicxml`]: it checks the partwise root,
//! derives the global measure list from the first part, then interprets
//! each part measure by measure. One id factory and, per part, one span
//! registry are threaded through the whole conversion, so output ids are
//! deterministic and spans may cross measure boundaries.

mod cursor;
mod measure;
mod parser;
mod spans;
mod tokens;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

use std::collections::HashMap;

use roxmltree::Node;

use crate::errors::ScoreError;
use crate::ids::IdFactory;
use crate::models::{Global, GlobalMeasure, MnxMeta, Part, Score};

/// Convert a partwise MusicXML string into the structured score model.
///
/// Fails only for malformed XML or a root other than `<score-partwise>`;
/// everything inside measures is handled leniently.
pub fn parse_musicxml(xml: &str) -> Result<Score, ScoreError> {
    let document = parser::parse_document(xml)?;
    let root = parser::partwise_root(&document)?;

    let mut ids = IdFactory::new();
    let part_names = parse_part_list(root);
    let part_nodes: Vec<Node> = parser::children(root, "part").collect();

    // global attributes are read from the first part only
    let global = build_global(part_nodes.first().copied());

    let mut parts = Vec::with_capacity(part_nodes.len());
    for node in part_nodes {
        parts.push(convert_part(node, &part_names, &mut ids));
    }

    Ok(Score {
        mnx: MnxMeta::default(),
        global,
        parts,
    })
}

/// Map score-part ids to display names from the part-list header
fn parse_part_list(root: Node) -> HashMap<String, String> {
    let mut names = HashMap::new();
    if let Some(part_list) = parser::child(root, "part-list") {
        for score_part in parser::children(part_list, "score-part") {
            if let (Some(id), Some(name)) = (
                score_part.attribute("id"),
                parser::child_text(score_part, "part-name"),
            ) {
                if !name.is_empty() {
                    names.insert(id.to_string(), name.to_string());
                }
            }
        }
    }
    names
}

/// Score-wide measure list (time, key, barline) from the reference part
fn build_global(reference: Option<Node>) -> Global {
    let mut measures = Vec::new();
    if let Some(part) = reference {
        for measure in parser::children(part, "measure") {
            let mut global_measure = GlobalMeasure::default();
            for attributes in parser::children(measure, "attributes") {
                if let Some(time) = parser::child(attributes, "time").and_then(parser::parse_time)
                {
                    global_measure.time = Some(time);
                }
                if let Some(key) = parser::child(attributes, "key").and_then(parser::parse_key) {
                    global_measure.key = Some(key);
                }
            }
            for barline in parser::children(measure, "barline") {
                if let Some(parsed) = parser::parse_barline(barline) {
                    global_measure.barline = Some(parsed);
                }
            }
            measures.push(global_measure);
        }
    }
    Global { measures }
}

fn convert_part(node: Node, names: &HashMap<String, String>, ids: &mut IdFactory) -> Part {
    let id = node.attribute("id").map(str::to_string);
    let name = id.as_ref().and_then(|id| names.get(id)).cloned();

    let mut spans = spans::PartContext::new();
    let mut divisions: u32 = 1;
    let mut measures = Vec::new();
    for (index, measure) in parser::children(node, "measure").enumerate() {
        // an explicit divisions value persists until the next explicit one
        for attributes in parser::children(measure, "attributes") {
            if let Some(value) = parser::child_parse::<u32>(attributes, "divisions") {
                if value > 0 {
                    divisions = value;
                }
            }
        }
        measures.push(measure::interpret_measure(
            measure, index, divisions, &mut spans, ids,
        ));
        spans.apply_end_fixups(&mut measures);
    }
    spans.resolve_pending(&mut measures);

    Part {
        id,
        name,
        measures,
        lyric_lines: spans.take_lyric_lines(),
    }
}
