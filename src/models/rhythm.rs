//! Rhythmic quantities: fractions of a whole note, symbolic durations,
//! positions within a measure.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Rational quantity measured against one whole note.
///
/// Positions produced by the time cursor keep the raw
/// `[ticks, divisions * 4]` form instead of reducing, so a consumer can
/// recover the source tick grid. Serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    /// Create a new fraction
    pub fn new(numerator: u64, denominator: u64) -> Self {
        assert!(denominator > 0, "Fraction denominator must be positive");
        Fraction {
            numerator,
            denominator,
        }
    }

    /// Reduced copy, for consumers that want the canonical form
    pub fn simplify(&self) -> Self {
        fn gcd(a: u64, b: u64) -> u64 {
            if b == 0 {
                a
            } else {
                gcd(b, a % b)
            }
        }
        let g = gcd(self.numerator, self.denominator).max(1);
        Fraction {
            numerator: self.numerator / g,
            denominator: self.denominator / g,
        }
    }
}

impl Serialize for Fraction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.numerator, self.denominator].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [numerator, denominator] = <[u64; 2]>::deserialize(deserializer)?;
        if denominator == 0 {
            return Err(D::Error::custom("Fraction denominator must be positive"));
        }
        Ok(Fraction {
            numerator,
            denominator,
        })
    }
}

/// A point within a measure, as a fraction of a whole note from the barline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmicPosition {
    pub fraction: Fraction,
}

/// Where a span closes: a measure index plus a position inside that measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEnd {
    pub measure: usize,
    pub position: RhythmicPosition,
}

/// Symbolic note value base, the `<type>` vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBase {
    Maxima,
    Long,
    Breve,
    Whole,
    Half,
    Quarter,
    Eighth,
    #[serde(rename = "16th")]
    Sixteenth,
    #[serde(rename = "32nd")]
    ThirtySecond,
    #[serde(rename = "64th")]
    SixtyFourth,
    #[serde(rename = "128th")]
    OneTwentyEighth,
    #[serde(rename = "256th")]
    TwoFiftySixth,
    #[serde(rename = "512th")]
    FiveTwelfth,
    #[serde(rename = "1024th")]
    TenTwentyFourth,
}

impl DurationBase {
    /// Parse a MusicXML `<type>` value
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "maxima" => Some(DurationBase::Maxima),
            "long" => Some(DurationBase::Long),
            "breve" => Some(DurationBase::Breve),
            "whole" => Some(DurationBase::Whole),
            "half" => Some(DurationBase::Half),
            "quarter" => Some(DurationBase::Quarter),
            "eighth" => Some(DurationBase::Eighth),
            "16th" => Some(DurationBase::Sixteenth),
            "32nd" => Some(DurationBase::ThirtySecond),
            "64th" => Some(DurationBase::SixtyFourth),
            "128th" => Some(DurationBase::OneTwentyEighth),
            "256th" => Some(DurationBase::TwoFiftySixth),
            "512th" => Some(DurationBase::FiveTwelfth),
            "1024th" => Some(DurationBase::TenTwentyFourth),
            _ => None,
        }
    }

    /// Length as a fraction of a whole note, `(numerator, denominator)`
    pub fn whole_note_fraction(&self) -> (u64, u64) {
        match self {
            DurationBase::Maxima => (8, 1),
            DurationBase::Long => (4, 1),
            DurationBase::Breve => (2, 1),
            DurationBase::Whole => (1, 1),
            DurationBase::Half => (1, 2),
            DurationBase::Quarter => (1, 4),
            DurationBase::Eighth => (1, 8),
            DurationBase::Sixteenth => (1, 16),
            DurationBase::ThirtySecond => (1, 32),
            DurationBase::SixtyFourth => (1, 64),
            DurationBase::OneTwentyEighth => (1, 128),
            DurationBase::TwoFiftySixth => (1, 256),
            DurationBase::FiveTwelfth => (1, 512),
            DurationBase::TenTwentyFourth => (1, 1024),
        }
    }
}

/// Symbolic duration: a base note value plus augmentation dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteValue {
    pub base: DurationBase,
    #[serde(default, skip_serializing_if = "dots_are_zero")]
    pub dots: u8,
}

impl NoteValue {
    pub fn new(base: DurationBase) -> Self {
        NoteValue { base, dots: 0 }
    }

    pub fn with_dots(base: DurationBase, dots: u8) -> Self {
        NoteValue { base, dots }
    }
}

fn dots_are_zero(dots: &u8) -> bool {
    *dots == 0
}

/// One side of a tuplet ratio: `multiple` units of `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupletPortion {
    pub duration: NoteValue,
    pub multiple: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_stays_unreduced() {
        let f = Fraction::new(2, 8);
        assert_eq!(f.numerator, 2);
        assert_eq!(f.denominator, 8);
        assert_eq!(f.simplify(), Fraction::new(1, 4));
    }

    #[test]
    fn test_fraction_serializes_as_pair() {
        let json = serde_json::to_string(&Fraction::new(3, 8)).unwrap();
        assert_eq!(json, "[3,8]");
        let back: Fraction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Fraction::new(3, 8));
    }

    #[test]
    fn test_zero_denominator_rejected_on_deserialize() {
        let result: Result<Fraction, _> = serde_json::from_str("[1,0]");
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_base_names_round_trip() {
        for name in [
            "maxima", "long", "breve", "whole", "half", "quarter", "eighth", "16th", "32nd",
            "64th", "128th", "256th", "512th", "1024th",
        ] {
            let base = DurationBase::from_name(name).unwrap();
            let json = serde_json::to_string(&base).unwrap();
            assert_eq!(json, format!("\"{}\"", name));
        }
        assert!(DurationBase::from_name("demisemihemi").is_none());
    }

    #[test]
    fn test_note_value_omits_zero_dots() {
        let plain = serde_json::to_string(&NoteValue::new(DurationBase::Quarter)).unwrap();
        assert_eq!(plain, r#"{"base":"quarter"}"#);
        let dotted =
            serde_json::to_string(&NoteValue::with_dots(DurationBase::Half, 1)).unwrap();
        assert_eq!(dotted, r#"{"base":"half","dots":1}"#);
    }
}
