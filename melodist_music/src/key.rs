// Key normalization: transpose every song to C major or A minor.
//
// Training on a single canonical key lets the model learn scale-relative
// melodic patterns instead of twelve copies of each. If the parser did not
// supply a key, one is estimated from the pitch content using the
// Krumhansl-Schmuckler key-finding algorithm: correlate a duration-weighted
// pitch-class histogram against the 24 rotated major/minor key profiles and
// keep the best match.
//
// The transposition interval is measured from the tonic in octave 4 to C4
// (major) or A4 (minor), so it ranges over -11..=0 for major keys and
// -2..=9 for minor keys. Church modes have no canonical target and are
// rejected rather than silently treated as major or minor.

use crate::duration::as_f64;
use crate::error::NormalizeError;
use crate::score::{Event, EventKind, Key, Mode, Score};

/// Krumhansl-Kessler probe-tone profile for major keys, indexed by scale
/// degree in semitones above the tonic.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler probe-tone profile for minor keys.
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Duration-weighted pitch-class histogram of all notes in the score.
pub fn pitch_class_histogram(score: &Score) -> [f64; 12] {
    let mut histogram = [0.0; 12];
    for event in &score.events {
        if let Some(pitch) = event.pitch() {
            histogram[(pitch % 12) as usize] += as_f64(event.duration);
        }
    }
    histogram
}

/// Estimate the key from pitch content. Returns `None` when the score
/// contains no notes. Ties go to the lowest tonic, major before minor.
pub fn estimate_key(score: &Score) -> Option<Key> {
    let histogram = pitch_class_histogram(score);
    if histogram.iter().all(|&w| w == 0.0) {
        return None;
    }

    let mut best: Option<(Key, f64)> = None;
    for tonic in 0..12u8 {
        for (mode, profile) in [(Mode::Major, &MAJOR_PROFILE), (Mode::Minor, &MINOR_PROFILE)] {
            let rotated: [f64; 12] =
                std::array::from_fn(|pc| profile[(pc + 12 - tonic as usize) % 12]);
            let r = correlation(&histogram, &rotated);
            if best.is_none_or(|(_, best_r)| r > best_r) {
                best = Some((Key::new(tonic, mode), r));
            }
        }
    }
    best.map(|(key, _)| key)
}

/// Pearson correlation; 0.0 when either input has no variance.
fn correlation(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    let mean_a = a.iter().sum::<f64>() / 12.0;
    let mean_b = b.iter().sum::<f64>() / 12.0;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..12 {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 { 0.0 } else { cov / denom }
}

/// Signed semitone shift that takes `key` to C major or A minor.
pub fn transposition_interval(key: &Key) -> Result<i16, NormalizeError> {
    let target = match key.mode {
        Mode::Major => Key::C_MAJOR.tonic,
        Mode::Minor => Key::A_MINOR.tonic,
        other => return Err(NormalizeError::UnsupportedMode(other)),
    };
    Ok(target as i16 - (key.tonic % 12) as i16)
}

/// Return a copy of `score` transposed to C major / A minor. The input key
/// is used when present, otherwise estimated.
pub fn normalize(score: &Score) -> Result<Score, NormalizeError> {
    let key = match score.key {
        Some(key) => key,
        None => estimate_key(score).ok_or(NormalizeError::KeyUndetermined)?,
    };
    let interval = transposition_interval(&key)?;

    let events = score
        .events
        .iter()
        .enumerate()
        .map(|(index, event)| match event.kind {
            EventKind::Rest => Ok(*event),
            EventKind::Note { pitch } => {
                let shifted = pitch as i16 + interval;
                if !(0..=127).contains(&shifted) {
                    return Err(NormalizeError::PitchOutOfRange {
                        index,
                        pitch,
                        interval,
                    });
                }
                Ok(Event::note(shifted as u8, event.duration))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let canonical = match key.mode {
        Mode::Minor => Key::A_MINOR,
        _ => Key::C_MAJOR,
    };
    Ok(Score::new(Some(canonical), events))
}
