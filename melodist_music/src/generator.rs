// Autoregressive melody generation.
//
// The generator keeps a buffer of context ids that starts as
// `sequence_length` delimiters (the "a melody begins here" signal the model
// saw between training songs) followed by the seed. Each step it:
//
// 1. trims the buffer to the last `max_context_length` ids,
// 2. asks the predictor for a distribution over the vocabulary,
// 3. reweights it by temperature and draws one id,
// 4. appends that id to the buffer and maps it back to a symbol,
// 5. stops if the symbol is the delimiter, otherwise appends it to the melody.
//
// Generation ends after `num_steps` draws or at the first delimiter,
// whichever comes first; the delimiter itself never reaches the output.
// Each step depends on the previous draw, so steps run strictly in sequence.
//
// Randomness comes from the caller's `Rng`, so a seeded `StdRng` makes a
// run reproducible.

use crate::config::GenerationParams;
use crate::duration::QuarterLength;
use crate::encoding::decode_symbols;
use crate::error::{DecodeError, GenerateError};
use crate::predictor::Predictor;
use crate::sampling::{sample_with_temperature, validate_temperature};
use crate::score::Score;
use crate::symbol::{Symbol, join_symbols, parse_symbols};
use crate::vocab::Vocabulary;
use rand::Rng;
use std::fmt;

/// Allowed deviation of a predictor's probabilities from summing to 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-4;

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The delimiter was sampled.
    Delimiter,
    /// `num_steps` symbols were generated.
    StepLimit,
}

/// Seed symbols followed by every generated non-delimiter symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMelody {
    pub symbols: Vec<Symbol>,
    pub termination: Termination,
}

impl GeneratedMelody {
    /// Decode to timed events, one slot per `step_duration`.
    pub fn to_score(&self, step_duration: QuarterLength) -> Result<Score, DecodeError> {
        decode_symbols(&self.symbols, step_duration)
    }
}

impl fmt::Display for GeneratedMelody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_symbols(&self.symbols))
    }
}

/// Samples melodies from a predictor over a fixed vocabulary.
pub struct MelodyGenerator<P> {
    predictor: P,
    vocabulary: Vocabulary,
    sequence_length: usize,
}

impl<P: Predictor> MelodyGenerator<P> {
    /// `sequence_length` is the training window length L: the number of
    /// leading delimiters in the context buffer.
    pub fn new(predictor: P, vocabulary: Vocabulary, sequence_length: usize) -> Self {
        MelodyGenerator {
            predictor,
            vocabulary,
            sequence_length,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Parse a space-separated seed such as `"67 _ _ _ 72 _"` and generate.
    pub fn generate_from_text(
        &mut self,
        seed: &str,
        params: &GenerationParams,
        rng: &mut impl Rng,
    ) -> Result<GeneratedMelody, GenerateError> {
        let seed = parse_symbols(seed)?;
        self.generate(&seed, params, rng)
    }

    /// Generate a melody continuing `seed`. All argument checks happen before
    /// the predictor is first called.
    pub fn generate(
        &mut self,
        seed: &[Symbol],
        params: &GenerationParams,
        rng: &mut impl Rng,
    ) -> Result<GeneratedMelody, GenerateError> {
        validate_temperature(params.temperature)?;
        if params.max_context_length == 0 {
            return Err(GenerateError::InvalidContextLength);
        }
        if seed.contains(&Symbol::Delimiter) {
            return Err(GenerateError::DelimiterInSeed);
        }

        let mut context = vec![self.vocabulary.delimiter_id(); self.sequence_length];
        for &symbol in seed {
            let id = self
                .vocabulary
                .id_of(symbol)
                .map_err(|_| GenerateError::UnknownSymbol(symbol))?;
            context.push(id);
        }

        let mut melody = seed.to_vec();
        for step in 0..params.num_steps {
            if context.len() > params.max_context_length {
                context.drain(..context.len() - params.max_context_length);
            }

            let probabilities = self.predictor.predict(&context)?;
            check_distribution(&probabilities, self.vocabulary.len())?;
            let id = sample_with_temperature(&probabilities, params.temperature, rng)?;
            context.push(id);

            let symbol = self.vocabulary.symbol_of(id)?;
            log::trace!("step {step}: sampled {symbol} (id {id}, p = {:.4})", probabilities[id]);
            if symbol == Symbol::Delimiter {
                log::debug!("delimiter sampled after {step} steps");
                return Ok(GeneratedMelody {
                    symbols: melody,
                    termination: Termination::Delimiter,
                });
            }
            melody.push(symbol);
        }

        Ok(GeneratedMelody {
            symbols: melody,
            termination: Termination::StepLimit,
        })
    }
}

/// Enforce the predictor contract: one finite, non-negative probability per
/// vocabulary id, summing to 1.
pub fn check_distribution(probabilities: &[f64], vocab_size: usize) -> Result<(), GenerateError> {
    if probabilities.len() != vocab_size {
        return Err(GenerateError::PredictorContractViolation(format!(
            "expected {vocab_size} probabilities, got {}",
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(GenerateError::PredictorContractViolation(format!(
            "invalid probability {p}"
        )));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(GenerateError::PredictorContractViolation(format!(
            "probabilities sum to {total}"
        )));
    }
    Ok(())
}
