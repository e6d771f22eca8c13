// MIDI output for decoded melodies.
//
// Renders a monophonic Score as a Standard MIDI File (format 1): track 0
// carries the tempo, track 1 the melody. Each note becomes a NoteOn at its
// onset and a NoteOff after its duration; rests only advance time, so the
// silence is folded into the delta of the next event.
//
// Uses the `midly` crate for encoding.

use crate::duration::{QuarterLength, ql, whole_steps};
use crate::error::MidiError;
use crate::score::{EventKind, Score};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Channel 0, acoustic grand piano.
const CHANNEL: u8 = 0;
const PROGRAM: u8 = 0;
const VELOCITY: u8 = 80;

/// Slowest tempo whose microseconds-per-quarter fits the 24-bit tempo field.
pub const MIN_TEMPO_BPM: u16 = 4;

/// Largest delta time a track event can carry (28 bits).
const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// Convert a Score to MIDI and write it to a file.
pub fn write_midi(score: &Score, tempo_bpm: u16, path: &Path) -> Result<(), MidiError> {
    let smf = score_to_smf(score, tempo_bpm)?;
    smf.save(path)?;
    Ok(())
}

/// Whole number of ticks for `duration`.
fn ticks(duration: QuarterLength) -> Result<u32, MidiError> {
    whole_steps(duration, ql(1, TICKS_PER_QUARTER as u32))
        .filter(|&t| t <= MAX_DELTA)
        .ok_or(MidiError::UnrepresentableDuration(duration))
}

/// Convert a Score to an in-memory SMF.
pub fn score_to_smf(score: &Score, tempo_bpm: u16) -> Result<Smf<'static>, MidiError> {
    if tempo_bpm < MIN_TEMPO_BPM {
        return Err(MidiError::InvalidTempo);
    }
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let tempo_microseconds = 60_000_000 / tempo_bpm as u32;
    if tempo_microseconds > 0xFF_FFFF {
        return Err(MidiError::InvalidTempo);
    }
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let channel = u4::new(CHANNEL);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Melody")),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PROGRAM),
                },
            },
        },
    ];

    // Ticks elapsed since the last emitted event.
    let mut pending_delta: u32 = 0;
    for event in &score.events {
        let length = ticks(event.duration)?;
        match event.kind {
            EventKind::Rest => {
                pending_delta = pending_delta
                    .checked_add(length)
                    .filter(|&d| d <= MAX_DELTA)
                    .ok_or(MidiError::UnrepresentableDuration(event.duration))?;
            }
            EventKind::Note { pitch } => {
                let key = u7::new(pitch.min(127));
                track.push(TrackEvent {
                    delta: u28::new(pending_delta),
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOn {
                            key,
                            vel: u7::new(VELOCITY),
                        },
                    },
                });
                track.push(TrackEvent {
                    delta: u28::new(length),
                    kind: TrackEventKind::Midi {
                        channel,
                        message: MidiMessage::NoteOff { key, vel: u7::new(0) },
                    },
                });
                pending_delta = 0;
            }
        }
    }

    // A trailing rest still lengthens the piece.
    track.push(TrackEvent {
        delta: u28::new(pending_delta),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Event;

    #[test]
    fn test_score_to_smf_basic() {
        let score = Score::new(
            None,
            vec![
                Event::note(60, ql(1, 1)),
                Event::rest(ql(1, 2)),
                Event::note(64, ql(1, 4)),
            ],
        );
        let smf = score_to_smf(&score, 90).unwrap();
        // Tempo track + melody track.
        assert_eq!(smf.tracks.len(), 2);

        let melody = &smf.tracks[1];
        // Name, program, 2 x (on, off), end.
        assert_eq!(melody.len(), 7);
        // The second NoteOn waits out the half-beat rest.
        assert_eq!(melody[4].delta.as_int(), 240);
        assert_eq!(melody[5].delta.as_int(), 120);
    }

    #[test]
    fn test_trailing_rest_extends_track() {
        let score = Score::new(None, vec![Event::note(60, ql(1, 1)), Event::rest(ql(2, 1))]);
        let smf = score_to_smf(&score, 120).unwrap();
        let end = smf.tracks[1].last().unwrap();
        assert_eq!(end.delta.as_int(), 960);
    }

    #[test]
    fn test_rejects_sub_tick_duration() {
        let score = Score::new(None, vec![Event::note(60, ql(1, 7))]);
        assert!(matches!(
            score_to_smf(&score, 120),
            Err(MidiError::UnrepresentableDuration(_))
        ));
        // Longer than a 28-bit delta allows.
        let score = Score::new(None, vec![Event::note(60, ql(600_000, 1))]);
        assert!(score_to_smf(&score, 120).is_err());
    }

    #[test]
    fn test_tempo_must_fit_tempo_field() {
        for bpm in [0, 1, 3] {
            assert!(matches!(
                score_to_smf(&Score::default(), bpm),
                Err(MidiError::InvalidTempo)
            ));
        }
        // 4 bpm is 15_000_000 us per quarter, inside 24 bits.
        let smf = score_to_smf(&Score::default(), MIN_TEMPO_BPM).unwrap();
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 15_000_000
        ));
    }
}
