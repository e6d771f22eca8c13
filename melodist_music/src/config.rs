// Data-driven pipeline configuration.
//
// All tunables live in `PipelineConfig`, loaded from a JSON file. Every field
// has a default, so a config file only needs to name what it changes (an
// empty `{}` is a valid config). Durations are written as strings like
// "1/4" (see duration.rs).
//
// The time step used for encoding and the step duration used for decoding
// are separate fields, but a corpus is only decoded faithfully when they
// agree.

use crate::duration::{ACCEPTABLE_DURATIONS, DEFAULT_TIME_STEP, QuarterLength, serde_ql, serde_ql_vec};
use crate::error::ConfigError;
use crate::midi::MIN_TEMPO_BPM;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Knobs for one run of the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Maximum number of symbols to sample after the seed.
    pub num_steps: usize,
    /// How many trailing context ids the predictor sees at each step.
    pub max_context_length: usize,
    /// Sampling temperature. 1.0 samples the predictor's distribution as-is;
    /// smaller is more conservative, larger more adventurous.
    pub temperature: f64,
    /// Quarter length of one decoded slot.
    #[serde(with = "serde_ql")]
    pub step_duration: QuarterLength,
    /// Tempo of the written MIDI file.
    pub tempo_bpm: u16,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            num_steps: 500,
            max_context_length: 64,
            temperature: 0.4,
            step_duration: DEFAULT_TIME_STEP,
            tempo_bpm: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Encoding quantum in quarter notes.
    #[serde(with = "serde_ql")]
    pub time_step: QuarterLength,
    /// Context window length L; also the delimiter run length between songs.
    pub sequence_length: usize,
    #[serde(with = "serde_ql_vec")]
    pub accepted_durations: Vec<QuarterLength>,
    /// Directory receiving one encoded file per accepted song.
    pub dataset_dir: PathBuf,
    /// Assembled corpus file.
    pub corpus_path: PathBuf,
    /// Vocabulary (token -> id) JSON file.
    pub vocabulary_path: PathBuf,
    /// Trained n-gram predictor JSON file.
    pub model_path: PathBuf,
    /// Longest context the n-gram predictor conditions on.
    pub ngram_order: usize,
    pub generation: GenerationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            time_step: DEFAULT_TIME_STEP,
            sequence_length: 64,
            accepted_durations: ACCEPTABLE_DURATIONS.to_vec(),
            dataset_dir: PathBuf::from("dataset"),
            corpus_path: PathBuf::from("file_dataset"),
            vocabulary_path: PathBuf::from("mapping.json"),
            model_path: PathBuf::from("model.json"),
            ngram_order: 4,
            generation: GenerationParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if *self.time_step.numer() == 0 {
            return invalid("time_step must be positive");
        }
        if self.sequence_length == 0 {
            return invalid("sequence_length must be at least 1");
        }
        if self.ngram_order == 0 {
            return invalid("ngram_order must be at least 1");
        }
        let generation = &self.generation;
        if !(generation.temperature.is_finite() && generation.temperature > 0.0) {
            return invalid("generation.temperature must be finite and positive");
        }
        if generation.max_context_length == 0 {
            return invalid("generation.max_context_length must be at least 1");
        }
        if *generation.step_duration.numer() == 0 {
            return invalid("generation.step_duration must be positive");
        }
        if generation.tempo_bpm < MIN_TEMPO_BPM {
            return invalid("generation.tempo_bpm must be at least 4");
        }
        Ok(())
    }
}
