//! Note and chord symbols
//!
//! A melody is a sequence of symbols. A single note is written with its pitch
//! name, an optional accidental (`#` sharp, `b` flat) and a signed octave
//! (`C4`, `F#3`, `Bb2`, `C-1`); a chord is written as its pitch classes in
//! normal order joined by dots (`0.4.7`, `7.11.2`). MIDI pitch 60 is `C4`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CantorError, Result};

/// Pitch names written with sharps, indexed by pitch class
const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave chord members are placed in when converted to pitches
pub const CHORD_OCTAVE: i32 = 4;

/// One melody step: a single pitch or a chord of pitch classes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// A MIDI pitch number
    Note(i32),
    /// De-duplicated pitch classes in normal order (0 = C .. 11 = B)
    Chord(Vec<u8>),
}

impl Symbol {
    /// Chord from arbitrary MIDI pitches, reduced to pitch classes in normal order
    pub fn chord_from_pitches<I: IntoIterator<Item = i32>>(pitches: I) -> Self {
        Symbol::Chord(normal_order(
            pitches.into_iter().map(|p| p.rem_euclid(12) as u8),
        ))
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, Symbol::Chord(_))
    }

    /// MIDI pitches sounded by this symbol
    ///
    /// Chord members are stacked upwards in normal order, starting from the
    /// first member in octave 4.
    pub fn to_pitches(&self) -> Vec<i32> {
        match self {
            Symbol::Note(pitch) => vec![*pitch],
            Symbol::Chord(classes) => {
                let mut pitches: Vec<i32> = Vec::with_capacity(classes.len());
                for &pc in classes {
                    let mut pitch = (CHORD_OCTAVE + 1) * 12 + pc as i32;
                    if let Some(&below) = pitches.last() {
                        while pitch <= below {
                            pitch += 12;
                        }
                    }
                    pitches.push(pitch);
                }
                pitches
            }
        }
    }
}

/// Rotation of the distinct pitch classes with the smallest span
///
/// Ties are broken by the interval from the first member to the second to
/// last, then to the third to last, and so on; a full tie keeps the rotation
/// starting on the lowest pitch class.
pub fn normal_order<I: IntoIterator<Item = u8>>(classes: I) -> Vec<u8> {
    let mut sorted: Vec<u8> = classes.into_iter().map(|pc| pc % 12).collect();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() < 2 {
        return sorted;
    }

    let n = sorted.len();
    let rotation =
        |start: usize| -> Vec<u8> { (0..n).map(|i| sorted[(start + i) % n]).collect() };
    // intervals above the first member, last member first
    let packing = |r: &[u8]| -> Vec<u8> {
        r.iter()
            .rev()
            .map(|&pc| (pc + 12 - r[0]) % 12)
            .collect()
    };

    (0..n)
        .map(rotation)
        .min_by(|a, b| packing(a).cmp(&packing(b)))
        .unwrap_or(sorted)
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Note(pitch) => {
                let name = PITCH_NAMES[pitch.rem_euclid(12) as usize];
                let octave = pitch.div_euclid(12) - 1;
                write!(f, "{}{}", name, octave)
            }
            Symbol::Chord(classes) => {
                let parts: Vec<String> = classes.iter().map(|pc| pc.to_string()).collect();
                write!(f, "{}", parts.join("."))
            }
        }
    }
}

impl FromStr for Symbol {
    type Err = CantorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CantorError::InvalidSymbol {
            symbol: s.to_string(),
        };
        let s = s.trim();
        if s.is_empty() {
            return Err(invalid());
        }

        // chords: dot-separated pitch classes, or a bare pitch class
        if s.contains('.') || s.chars().all(|c| c.is_ascii_digit()) {
            let mut classes = Vec::new();
            for part in s.split('.') {
                let pc: u8 = part.parse().map_err(|_| invalid())?;
                if pc > 11 {
                    return Err(invalid());
                }
                classes.push(pc);
            }
            return Ok(Symbol::Chord(normal_order(classes)));
        }

        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };
        let digits = octave.strip_prefix('-').unwrap_or(octave);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i32 = octave.parse().map_err(|_| invalid())?;

        octave
            .checked_add(1)
            .and_then(|o| o.checked_mul(12))
            .and_then(|p| p.checked_add(base + accidental))
            .map(Symbol::Note)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CantorError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}
