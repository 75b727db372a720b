//! Identifier generation for output elements
//!
//! Every event, note, multi-note tremolo and lyric line in the output model
//! carries a string id. Ids are minted sequentially per prefix ("ev1",
//! "ev2", "note1", ...) by a factory that lives for exactly one conversion,
//! so converting the same document twice yields identical ids and
//! concurrent conversions never observe each other.

use std::collections::HashMap;

/// Sequential id factory, one per conversion.
#[derive(Debug, Default)]
pub struct IdFactory {
    counters: HashMap<&'static str, u64>,
}

impl IdFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id for `prefix`. Numbering starts at 1.
    pub fn mint(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{}{}", prefix, counter)
    }
}
