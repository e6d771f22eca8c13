// Error types for every pipeline stage.
//
// Corpus-side stages (filter, normalize, encode) fail per song; the batch
// preprocessor wraps them in `SongError` and skips the song. Generation and
// decoding failures abort the call that raised them. Nothing is retried.

use crate::duration::QuarterLength;
use crate::score::Mode;
use crate::symbol::Symbol;
use thiserror::Error;

/// A score contains a duration outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("event {index} has unacceptable duration {duration} quarter notes")]
    UnacceptableDuration {
        index: usize,
        duration: QuarterLength,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Only major and minor keys have a canonical target (C major / A minor).
    #[error("unsupported key mode '{0}'")]
    UnsupportedMode(Mode),
    /// No key was given and the score has no pitched content to estimate one.
    #[error("score has no key and no notes to estimate one from")]
    KeyUndetermined,
    #[error("event {index}: pitch {pitch} transposed by {interval} leaves the MIDI range")]
    PitchOutOfRange {
        index: usize,
        pitch: u8,
        interval: i16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("time step must be positive")]
    InvalidTimeStep,
    /// Duration is not a positive whole number of time steps.
    #[error("event {index}: duration {duration} is not a multiple of time step {time_step}")]
    Quantization {
        index: usize,
        duration: QuarterLength,
        time_step: QuarterLength,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized token '{0}'")]
    UnrecognizedToken(String),
    #[error("step duration must be positive")]
    InvalidStepDuration,
}

/// Why a single song was dropped from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SongError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("symbol '{0}' is not in the vocabulary")]
    UnknownSymbol(Symbol),
    #[error("id {id} is out of range for a vocabulary of {len} symbols")]
    InvalidId { id: usize, len: usize },
    #[error("malformed vocabulary: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a predictor backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    #[error("context id {id} is out of range for a vocabulary of {vocab_size} symbols")]
    ContextIdOutOfRange { id: usize, vocab_size: usize },
    #[error("malformed predictor model: {0}")]
    MalformedModel(String),
    #[error("predictor backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("seed symbol '{0}' is not in the vocabulary")]
    UnknownSymbol(Symbol),
    #[error("seed must not contain the song delimiter")]
    DelimiterInSeed,
    #[error("temperature must be finite and positive, got {0}")]
    InvalidTemperature(f64),
    #[error("max context length must be at least 1")]
    InvalidContextLength,
    #[error("predictor contract violation: {0}")]
    PredictorContractViolation(String),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("duration {0} is not a whole number of MIDI ticks")]
    UnrepresentableDuration(QuarterLength),
    #[error("tempo must be at least 4 bpm")]
    InvalidTempo,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
