// Score representation: the structured input and output of the pipeline.
//
// A score is a monophonic, ordered list of note and rest events plus an
// optional key. Scores arrive from an external notation parser as JSON,
// pass through the normalizer (which returns a new, transposed score), and
// come back out of the decoder. Nothing in the pipeline mutates a score in
// place.
//
// Durations are exact quarter lengths (see duration.rs). Pitches are MIDI
// note numbers (60 = middle C).

use crate::duration::{QuarterLength, serde_ql};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mode of a key. Parsers may report church modes; only major and minor
/// survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Locrian => "locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key: tonic pitch class (0 = C, 2 = D, ... 11 = B) and mode.
///
/// Deserialization rejects a tonic outside 0..12 rather than guessing an
/// octave for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct Key {
    pub tonic: u8,
    pub mode: Mode,
}

impl Key {
    pub const C_MAJOR: Key = Key {
        tonic: 0,
        mode: Mode::Major,
    };
    pub const A_MINOR: Key = Key {
        tonic: 9,
        mode: Mode::Minor,
    };

    pub fn new(tonic: u8, mode: Mode) -> Self {
        Key {
            tonic: tonic % 12,
            mode,
        }
    }
}

#[derive(Deserialize)]
struct RawKey {
    tonic: u8,
    mode: Mode,
}

impl TryFrom<RawKey> for Key {
    type Error = String;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        if raw.tonic >= 12 {
            return Err(format!("tonic {} is not a pitch class (0-11)", raw.tonic));
        }
        Ok(Key {
            tonic: raw.tonic,
            mode: raw.mode,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", pitch_class_name(self.tonic), self.mode)
    }
}

/// Note or rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Note { pitch: u8 },
    Rest,
}

/// One timed event of a melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(with = "serde_ql")]
    pub duration: QuarterLength,
}

impl Event {
    pub fn note(pitch: u8, duration: QuarterLength) -> Self {
        Event {
            kind: EventKind::Note { pitch },
            duration,
        }
    }

    pub fn rest(duration: QuarterLength) -> Self {
        Event {
            kind: EventKind::Rest,
            duration,
        }
    }

    /// MIDI pitch, or `None` for a rest.
    pub fn pitch(&self) -> Option<u8> {
        match self.kind {
            EventKind::Note { pitch } => Some(pitch),
            EventKind::Rest => None,
        }
    }
}

/// A monophonic melody with optional key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Key as reported by the parser. `None` means "estimate from content".
    #[serde(default)]
    pub key: Option<Key>,
    pub events: Vec<Event>,
}

impl Score {
    pub fn new(key: Option<Key>, events: Vec<Event>) -> Self {
        Score { key, events }
    }

    /// Total length in quarter notes.
    pub fn total_duration(&self) -> QuarterLength {
        self.events.iter().map(|e| e.duration).sum()
    }

    /// Load a JSON array of scores, as emitted by the score parser.
    pub fn load_all(path: &std::path::Path) -> Result<Vec<Score>, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let scores: Vec<Score> = serde_json::from_str(&data)?;
        Ok(scores)
    }
}

/// Pitch-class name with flats for the black keys the way key signatures
/// usually spell them (e.g. 3 -> "Eb").
pub fn pitch_class_name(pc: u8) -> &'static str {
    match pc % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}
