//! Token stream construction
//!
//! Flattens one measure's `<note>` and `<direction>` children into a
//! single ordered list. Directions survive only when they carry a
//! sub-kind the interpreter understands.

use std::cmp::Ordering;

use roxmltree::Node;

use super::parser;

/// Sort rank at equal positions: directions precede notes, a direction
/// being a preparation for the note that follows at the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TokenKind {
    Direction,
    Note,
}

/// One measure child selected for interpretation
#[derive(Debug, Clone, Copy)]
pub struct Token<'a, 'input> {
    pub kind: TokenKind,
    pub node: Node<'a, 'input>,
    x: f64,
}

/// Collect and order the tokens of one measure.
///
/// The sort key is the `default-x` attribute (0 when absent); ties are
/// broken by kind, then by source order.
pub fn token_stream<'a, 'input>(measure: Node<'a, 'input>) -> Vec<Token<'a, 'input>> {
    let mut tokens: Vec<Token> = Vec::new();
    for node in parser::children(measure, "direction") {
        if is_recognized_direction(node) {
            tokens.push(Token {
                kind: TokenKind::Direction,
                node,
                x: sort_key(node),
            });
        }
    }
    for node in parser::children(measure, "note") {
        tokens.push(Token {
            kind: TokenKind::Note,
            node,
            x: sort_key(node),
        });
    }
    tokens.sort_by(compare);
    tokens
}

fn compare(a: &Token, b: &Token) -> Ordering {
    a.x.total_cmp(&b.x).then(a.kind.cmp(&b.kind))
}

fn sort_key(node: Node) -> f64 {
    parser::attr_parse::<f64>(node, "default-x")
        .filter(|x| x.is_finite())
        .unwrap_or(0.0)
}

/// A direction is kept only when some direction-type child holds a
/// dynamics, wedge, octave-shift or pedal element
fn is_recognized_direction(direction: Node) -> bool {
    parser::children(direction, "direction-type").any(|direction_type| {
        direction_type.children().any(|child| {
            child.is_element()
                && matches!(
                    child.tag_name().name(),
                    "dynamics" | "wedge" | "octave-shift" | "pedal"
                )
        })
    })
}
