// Duration filter: reject songs whose rhythms the encoder should not see.
//
// Tuplets, grace notes, and very long notes are rare in the folk corpora this
// pipeline targets. Rather than quantizing them (which would distort the
// melody), any song containing one is dropped whole. There is no partial
// acceptance of a valid prefix.

use crate::duration::QuarterLength;
use crate::error::FilterError;
use crate::score::Score;

/// Check every event against `accepted`. Fails on the first offending event.
pub fn check_durations(score: &Score, accepted: &[QuarterLength]) -> Result<(), FilterError> {
    match score
        .events
        .iter()
        .position(|e| !accepted.contains(&e.duration))
    {
        Some(index) => Err(FilterError::UnacceptableDuration {
            index,
            duration: score.events[index].duration,
        }),
        None => Ok(()),
    }
}

pub fn has_acceptable_durations(score: &Score, accepted: &[QuarterLength]) -> bool {
    check_durations(score, accepted).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{ACCEPTABLE_DURATIONS, ql};
    use crate::score::Event;

    #[test]
    fn test_accepts_canonical_durations() {
        let score = Score::new(
            None,
            ACCEPTABLE_DURATIONS
                .iter()
                .map(|&d| Event::note(60, d))
                .collect(),
        );
        assert!(has_acceptable_durations(&score, &ACCEPTABLE_DURATIONS));
    }

    #[test]
    fn test_rejects_triplet_after_valid_prefix() {
        let score = Score::new(
            None,
            vec![
                Event::note(60, ql(1, 1)),
                Event::rest(ql(1, 2)),
                Event::note(62, ql(1, 3)),
                Event::note(64, ql(1, 1)),
            ],
        );
        assert_eq!(
            check_durations(&score, &ACCEPTABLE_DURATIONS),
            Err(FilterError::UnacceptableDuration {
                index: 2,
                duration: ql(1, 3),
            })
        );
    }

    #[test]
    fn test_empty_score_passes() {
        assert!(has_acceptable_durations(&Score::default(), &ACCEPTABLE_DURATIONS));
    }
}
