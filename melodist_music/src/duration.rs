// Exact quarter-note durations.
//
// Every duration in the pipeline is a rational number of quarter notes, so
// quantization checks ("is this a whole number of time steps?") are exact
// and never suffer from float rounding. On disk, durations are strings such
// as "1/4", "3", or "0.75"; plain JSON numbers are also accepted when
// reading, since score parsers commonly emit float quarter lengths.

use num_rational::Ratio;
use serde::{Deserialize, Deserializer, Serializer};

/// A duration measured in quarter notes.
pub type QuarterLength = Ratio<u32>;

/// Build a quarter length from a fraction. `denom` must be non-zero and the
/// fraction should already be in lowest terms.
pub const fn ql(numer: u32, denom: u32) -> QuarterLength {
    Ratio::new_raw(numer, denom)
}

/// The default encoding quantum: one sixteenth note.
pub const DEFAULT_TIME_STEP: QuarterLength = ql(1, 4);

/// Durations a folk-song corpus is allowed to contain: sixteenth through
/// whole note, plus dotted eighth, dotted quarter, and dotted half.
pub const ACCEPTABLE_DURATIONS: [QuarterLength; 8] = [
    ql(1, 4),
    ql(1, 2),
    ql(3, 4),
    ql(1, 1),
    ql(3, 2),
    ql(2, 1),
    ql(3, 1),
    ql(4, 1),
];

/// How many whole `step`s fit in `duration`, or `None` if `step` is zero or
/// does not divide `duration` exactly.
pub fn whole_steps(duration: QuarterLength, step: QuarterLength) -> Option<u32> {
    if *step.numer() == 0 {
        return None;
    }
    let quotient = duration / step;
    quotient.is_integer().then(|| quotient.to_integer())
}

/// Lossy conversion for weighting and display.
pub fn as_f64(duration: QuarterLength) -> f64 {
    *duration.numer() as f64 / *duration.denom() as f64
}

/// Parse "3/4", "3", or a decimal such as "0.75" into an exact quarter length.
pub fn parse_quarter_length(text: &str) -> Option<QuarterLength> {
    let text = text.trim();
    if text.contains('.') {
        parse_decimal(text).or_else(|| text.parse().ok().and_then(from_f64))
    } else {
        text.parse().ok()
    }
}

fn parse_decimal(text: &str) -> Option<QuarterLength> {
    let (whole, frac) = text.split_once('.')?;
    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return None;
    }
    if frac.len() > 9 {
        return None;
    }
    let scale = 10u64.pow(frac.len() as u32);
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    let reduced = Ratio::new(whole.checked_mul(scale)?.checked_add(frac)?, scale);
    Some(Ratio::new(
        u32::try_from(*reduced.numer()).ok()?,
        u32::try_from(*reduced.denom()).ok()?,
    ))
}

/// Largest denominator tried when snapping a float to a fraction. Covers
/// tuplets down to 32nd-note sextuplets.
const MAX_FLOAT_DENOMINATOR: u32 = 96;

/// Snap a float quarter length (0.333.. for a triplet eighth) to the nearest
/// small-denominator fraction, if one is within rounding distance.
pub fn from_f64(value: f64) -> Option<QuarterLength> {
    let limit = u32::MAX as f64 / MAX_FLOAT_DENOMINATOR as f64;
    if !(0.0..=limit).contains(&value) {
        return None;
    }
    (1..=MAX_FLOAT_DENOMINATOR).find_map(|denom| {
        let numer = (value * denom as f64).round();
        ((numer / denom as f64 - value).abs() < 1e-6).then(|| Ratio::new(numer as u32, denom))
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuarterLength {
    Text(String),
    Number(f64),
}

impl RawQuarterLength {
    fn resolve<E: serde::de::Error>(self) -> Result<QuarterLength, E> {
        match self {
            RawQuarterLength::Text(text) => parse_quarter_length(&text)
                .ok_or_else(|| E::custom(format!("invalid quarter length '{text}'"))),
            RawQuarterLength::Number(value) => {
                from_f64(value).ok_or_else(|| E::custom(format!("invalid quarter length {value}")))
            }
        }
    }
}

/// `#[serde(with = "...")]` adapter for a single `QuarterLength`.
pub mod serde_ql {
    use super::*;

    pub fn serialize<S: Serializer>(value: &QuarterLength, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<QuarterLength, D::Error> {
        RawQuarterLength::deserialize(d)?.resolve()
    }
}

/// `#[serde(with = "...")]` adapter for a list of `QuarterLength`s.
pub mod serde_ql_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[QuarterLength], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<QuarterLength>, D::Error> {
        Vec::<RawQuarterLength>::deserialize(d)?
            .into_iter()
            .map(RawQuarterLength::resolve)
            .collect()
    }
}
