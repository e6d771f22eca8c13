// Time-series encoding and decoding of melodies.
//
// Encoding walks a score's events in order and, for each event lasting
// `steps = duration / time_step` slots, emits its start symbol (a MIDI pitch
// or "r") followed by `steps - 1` hold markers. A C4 quarter note at a
// sixteenth-note time step becomes `60 _ _ _`.
//
// Decoding is the inverse run-length scan: a hold extends the pending event
// by one slot; any other symbol (or the end of input) flushes the pending
// event with `duration = step_duration * slots` and starts a new one. A
// delimiter flushes and leaves nothing pending. Holds with nothing pending
// (at the very start, or right after a delimiter) have no event to extend
// and are dropped.
//
// For any score whose durations are whole multiples of the time step,
// `decode(encode(score))` reproduces its (pitch-or-rest, duration) sequence.

use crate::duration::{QuarterLength, whole_steps};
use crate::error::{DecodeError, EncodeError};
use crate::score::{Event, EventKind, Score};
use crate::symbol::{Symbol, join_symbols, parse_symbols};
use num_rational::Ratio;
use std::fmt;
use std::str::FromStr;

/// One song as a symbol stream, one symbol per time-step slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedSong {
    symbols: Vec<Symbol>,
}

impl EncodedSong {
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        EncodedSong { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for EncodedSong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_symbols(&self.symbols))
    }
}

impl FromStr for EncodedSong {
    type Err = DecodeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_symbols(text).map(EncodedSong::from_symbols)
    }
}

/// Encode a (normalized) score at the given time step.
pub fn encode_song(score: &Score, time_step: QuarterLength) -> Result<EncodedSong, EncodeError> {
    if *time_step.numer() == 0 {
        return Err(EncodeError::InvalidTimeStep);
    }

    let mut symbols = Vec::new();
    for (index, event) in score.events.iter().enumerate() {
        let steps = whole_steps(event.duration, time_step)
            .filter(|&s| s > 0)
            .ok_or(EncodeError::Quantization {
                index,
                duration: event.duration,
                time_step,
            })?;

        symbols.push(match event.kind {
            EventKind::Note { pitch } => Symbol::Pitch(pitch),
            EventKind::Rest => Symbol::Rest,
        });
        symbols.extend(std::iter::repeat_n(Symbol::Hold, steps as usize - 1));
    }
    Ok(EncodedSong { symbols })
}

/// Decode a symbol stream into a key-less score.
pub fn decode_symbols(symbols: &[Symbol], step_duration: QuarterLength) -> Result<Score, DecodeError> {
    if *step_duration.numer() == 0 {
        return Err(DecodeError::InvalidStepDuration);
    }

    let mut events = Vec::new();
    let mut pending: Option<Symbol> = None;
    let mut slots: u32 = 0;

    for &symbol in symbols {
        match symbol {
            Symbol::Hold => {
                if pending.is_some() {
                    slots += 1;
                }
            }
            Symbol::Delimiter => {
                flush(&mut events, pending.take(), slots, step_duration);
                slots = 0;
            }
            Symbol::Pitch(_) | Symbol::Rest => {
                flush(&mut events, pending.replace(symbol), slots, step_duration);
                slots = 1;
            }
        }
    }
    flush(&mut events, pending.take(), slots, step_duration);

    Ok(Score::new(None, events))
}

/// Decode whitespace-separated text. Unknown tokens are fatal.
pub fn decode_str(text: &str, step_duration: QuarterLength) -> Result<Score, DecodeError> {
    decode_symbols(&parse_symbols(text)?, step_duration)
}

fn flush(events: &mut Vec<Event>, pending: Option<Symbol>, slots: u32, step: QuarterLength) {
    let duration = step * Ratio::from_integer(slots);
    match pending {
        Some(Symbol::Pitch(pitch)) => events.push(Event::note(pitch, duration)),
        Some(Symbol::Rest) => events.push(Event::rest(duration)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{DEFAULT_TIME_STEP, ql};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn two_events() -> Score {
        Score::new(None, vec![Event::note(60, ql(1, 1)), Event::rest(ql(1, 2))])
    }

    #[test]
    fn test_encode_note_and_rest() {
        let encoded = encode_song(&two_events(), DEFAULT_TIME_STEP).unwrap();
        assert_eq!(encoded.to_string(), "60 _ _ _ r _");
        assert_eq!(encoded.len(), 6);
    }

    #[test]
    fn test_decode_note_and_rest() {
        let decoded = decode_str("60 _ _ _ r _", DEFAULT_TIME_STEP).unwrap();
        assert_eq!(decoded.events, two_events().events);
        assert_eq!(decoded.key, None);
    }

    #[test]
    fn test_round_trip_and_duration_conservation() {
        let score = Score::new(
            None,
            vec![
                Event::note(67, ql(3, 4)),
                Event::note(67, ql(1, 4)),
                Event::rest(ql(1, 1)),
                Event::note(72, ql(3, 2)),
                Event::note(71, ql(1, 2)),
                Event::note(69, ql(4, 1)),
            ],
        );
        let encoded = encode_song(&score, DEFAULT_TIME_STEP).unwrap();
        let decoded = decode_symbols(encoded.symbols(), DEFAULT_TIME_STEP).unwrap();
        assert_eq!(decoded.events, score.events);
        assert_eq!(
            decoded.total_duration(),
            DEFAULT_TIME_STEP * Ratio::from_integer(encoded.len() as u32)
        );
    }

    #[test]
    fn test_random_scores_round_trip() {
        let mut rng = StdRng::seed_from_u64(17);
        for time_step in [DEFAULT_TIME_STEP, ql(1, 2), ql(1, 3), ql(3, 4)] {
            for _ in 0..200 {
                let num_events = rng.random_range(0..40);
                let events: Vec<Event> = (0..num_events)
                    .map(|_| {
                        let duration = time_step * Ratio::from_integer(rng.random_range(1..=16));
                        if rng.random_bool(0.2) {
                            Event::rest(duration)
                        } else {
                            Event::note(rng.random_range(0..=127), duration)
                        }
                    })
                    .collect();
                let score = Score::new(None, events);

                let encoded = encode_song(&score, time_step).unwrap();
                let decoded = decode_symbols(encoded.symbols(), time_step).unwrap();
                assert_eq!(decoded.events, score.events);
                assert_eq!(
                    decoded.total_duration(),
                    time_step * Ratio::from_integer(encoded.len() as u32)
                );
            }
        }
    }

    #[test]
    fn test_repeated_pitch_stays_two_events() {
        let decoded = decode_str("60 _ 60 _", ql(1, 2)).unwrap();
        assert_eq!(
            decoded.events,
            vec![Event::note(60, ql(1, 1)), Event::note(60, ql(1, 1))]
        );
    }

    #[test]
    fn test_final_event_is_flushed() {
        // Ends on a bare start symbol.
        let decoded = decode_str("60 _ 62", DEFAULT_TIME_STEP).unwrap();
        assert_eq!(
            decoded.events,
            vec![Event::note(60, ql(1, 2)), Event::note(62, ql(1, 4))]
        );
        // Ends on holds.
        let decoded = decode_str("r _ _", DEFAULT_TIME_STEP).unwrap();
        assert_eq!(decoded.events, vec![Event::rest(ql(3, 4))]);
    }

    #[test]
    fn test_delimiter_and_orphan_holds() {
        let decoded = decode_str("_ 60 _ / _ 62", DEFAULT_TIME_STEP).unwrap();
        assert_eq!(
            decoded.events,
            vec![Event::note(60, ql(1, 2)), Event::note(62, ql(1, 4))]
        );
    }

    #[test]
    fn test_quantization_error() {
        let score = Score::new(None, vec![Event::note(60, ql(1, 1)), Event::note(62, ql(1, 3))]);
        assert_eq!(
            encode_song(&score, DEFAULT_TIME_STEP),
            Err(EncodeError::Quantization {
                index: 1,
                duration: ql(1, 3),
                time_step: DEFAULT_TIME_STEP,
            })
        );
        let zero = Score::new(None, vec![Event::rest(Ratio::from_integer(0))]);
        assert!(encode_song(&zero, DEFAULT_TIME_STEP).is_err());
        assert_eq!(
            encode_song(&zero, Ratio::from_integer(0)),
            Err(EncodeError::InvalidTimeStep)
        );
    }

    #[test]
    fn test_decode_rejects_unknown_token() {
        assert_eq!(
            decode_str("60 _ x", DEFAULT_TIME_STEP),
            Err(DecodeError::UnrecognizedToken("x".to_string()))
        );
        assert_eq!(
            decode_str("60", Ratio::from_integer(0)),
            Err(DecodeError::InvalidStepDuration)
        );
    }

    #[test]
    fn test_song_text_round_trip() {
        let song: EncodedSong = "64 _ 63 _ _".parse().unwrap();
        assert_eq!(song.to_string(), "64 _ 63 _ _");
    }
}
