use std::fmt::Display;
use std::str::FromStr;

use crate::notation::NotationError;

static NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Sounding pitch, as MIDI note number (60 is middle C, "C4").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch {
    midi: u8,
}
impl Pitch {
    pub fn from_midi(midi: u8) -> Self {
        Self { midi: midi.min(127) }
    }
    pub fn midi(&self) -> u8 {
        self.midi
    }
    pub fn octave(&self) -> i8 {
        (self.midi / 12) as i8 - 1
    }
}
impl Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[(self.midi % 12) as usize], self.octave())
    }
}
impl FromStr for Pitch {
    type Err = NotationError;

    /// Parses names like "C4", "f#3", "Bb-1".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::UnexpectedToken(s.to_string());
        let mut chars = s.chars();
        let step = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(err()),
        };
        let rest = chars.as_str();
        let (alter, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };
        let octave: i32 = octave.parse().map_err(|_| err())?;
        let midi = (octave + 1) * 12 + step + alter;
        match midi {
            0..=127 => Ok(Self::from_midi(midi as u8)),
            _ => Err(err()),
        }
    }
}
