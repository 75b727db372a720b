//! Per-voice time cursors
//!
//! One independent tick accumulator per voice, scoped to a single measure.
//! Ticks are integer multiples of the part's `divisions` unit (ticks per
//! quarter note); positions are reported against a whole-note denominator
//! of `divisions * 4`, left unreduced so the source tick grid stays
//! recoverable.

use std::collections::HashMap;

use crate::models::{Fraction, RhythmicPosition};

#[derive(Debug)]
pub struct TimeCursor {
    ticks_per_whole: u64,
    elapsed: HashMap<String, u64>,
}

impl TimeCursor {
    pub fn new(divisions: u32) -> Self {
        TimeCursor {
            ticks_per_whole: u64::from(divisions) * 4,
            elapsed: HashMap::new(),
        }
    }

    /// Add consumed ticks to one voice's accumulator
    pub fn advance(&mut self, voice: &str, ticks: u64) {
        *self.elapsed.entry(voice.to_string()).or_insert(0) += ticks;
    }

    /// Current position of a voice, measured from the start of the measure
    pub fn position(&self, voice: &str) -> RhythmicPosition {
        let ticks = self.elapsed.get(voice).copied().unwrap_or(0);
        RhythmicPosition {
            fraction: Fraction::new(ticks, self.ticks_per_whole),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_keeps_raw_tick_denominator() {
        let mut cursor = TimeCursor::new(2);
        cursor.advance("1", 2);
        assert_eq!(cursor.position("1").fraction, Fraction::new(2, 8));
        cursor.advance("1", 2);
        assert_eq!(cursor.position("1").fraction, Fraction::new(4, 8));
    }

    #[test]
    fn test_voices_accumulate_independently() {
        let mut cursor = TimeCursor::new(4);
        cursor.advance("1", 8);
        cursor.advance("2", 4);
        assert_eq!(cursor.position("1").fraction, Fraction::new(8, 16));
        assert_eq!(cursor.position("2").fraction, Fraction::new(4, 16));
        assert_eq!(cursor.position("3").fraction, Fraction::new(0, 16));
    }
}
