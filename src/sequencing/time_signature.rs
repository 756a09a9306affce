use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MetronomeError;

/// Meter descriptor: how many beats make a measure and which are accented.
///
/// Only the fixed table below is selectable. Accent positions are 1-based beat
/// numbers, the way a musician counts them.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(into = "String"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per measure (numerator)
    pub beats: u8,
    /// Note value that gets one beat (denominator)
    pub unit: u8,
    /// 1-based beat numbers played with an accent
    pub accents: &'static [u8],
}

impl TimeSignature {
    /// 2/4, march time
    pub const TWO_FOUR: TimeSignature = TimeSignature {
        beats: 2,
        unit: 4,
        accents: &[1],
    };

    /// 3/4, waltz
    pub const THREE_FOUR: TimeSignature = TimeSignature {
        beats: 3,
        unit: 4,
        accents: &[1],
    };

    /// 4/4, common time
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        beats: 4,
        unit: 4,
        accents: &[1],
    };

    /// 6/8, compound duple: two groups of three eighths
    pub const SIX_EIGHT: TimeSignature = TimeSignature {
        beats: 6,
        unit: 8,
        accents: &[1, 4],
    };

    /// Selector order.
    pub const ALL: [TimeSignature; 4] = [
        Self::TWO_FOUR,
        Self::THREE_FOUR,
        Self::FOUR_FOUR,
        Self::SIX_EIGHT,
    ];

    /// Beats per measure as an index bound.
    pub fn beats(&self) -> usize {
        self.beats as usize
    }

    /// Whether the 1-based `beat_number` carries an accent.
    pub fn is_accent(&self, beat_number: usize) -> bool {
        self.accents.iter().any(|&a| a as usize == beat_number)
    }

    /// The next entry of the selector, wrapping around.
    pub fn next(&self) -> TimeSignature {
        let index = Self::ALL.iter().position(|ts| ts == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.beats, self.unit)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

impl FromStr for TimeSignature {
    type Err = MetronomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|ts| ts.label() == wanted)
            .ok_or_else(|| MetronomeError::UnknownTimeSignature(s.to_string()))
    }
}

/// Read back from its label; the accent table is looked up, never borrowed
/// from the input.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TimeSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> Self {
        ts.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_eight_accents_one_and_four() {
        let ts = TimeSignature::SIX_EIGHT;
        let accents: Vec<bool> = (1..=6).map(|n| ts.is_accent(n)).collect();
        assert_eq!(accents, [true, false, false, true, false, false]);
    }

    #[test]
    fn simple_meters_accent_downbeat_only() {
        for ts in [
            TimeSignature::TWO_FOUR,
            TimeSignature::THREE_FOUR,
            TimeSignature::FOUR_FOUR,
        ] {
            assert!(ts.is_accent(1));
            assert!((2..=ts.beats()).all(|n| !ts.is_accent(n)), "{ts}");
        }
    }

    #[test]
    fn parses_table_entries_only() {
        assert_eq!("3/4".parse::<TimeSignature>().unwrap(), TimeSignature::THREE_FOUR);
        assert_eq!(" 6/8 ".parse::<TimeSignature>().unwrap(), TimeSignature::SIX_EIGHT);
        assert!("5/4".parse::<TimeSignature>().is_err());
    }

    #[test]
    fn selector_wraps() {
        assert_eq!(TimeSignature::SIX_EIGHT.next(), TimeSignature::TWO_FOUR);
        assert_eq!(TimeSignature::TWO_FOUR.next(), TimeSignature::THREE_FOUR);
    }
}
