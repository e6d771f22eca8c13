// Melodist: symbolic melody encoding and generation.
//
// Turns monophonic scores into a fixed-step time-series of symbols (MIDI
// pitch, hold "_", rest "r"), builds the training corpus and vocabulary a
// next-symbol model learns from, and samples new melodies from such a model
// with temperature control. The model itself sits behind the `Predictor`
// trait; an n-gram predictor is included so the whole pipeline runs
// end to end.
//
// Architecture:
// - duration.rs: Exact quarter-length arithmetic (rationals), the default
//   time step and the acceptable-duration set
// - score.rs: Score / Event / Key types (the parser-facing data model)
// - filter.rs: Rejects songs containing durations outside the accepted set
// - key.rs: Key estimation (Krumhansl-Schmuckler) and transposition to
//   C major / A minor
// - symbol.rs: The symbol alphabet and its text form
// - encoding.rs: Score -> symbol time-series and back
// - preprocess.rs: Parallel batch filter -> normalize -> encode
// - corpus.rs: Corpus assembly with delimiter runs, training windows,
//   one-hot encoding
// - vocab.rs: Deterministic symbol <-> id mapping with JSON persistence
// - predictor.rs: The `Predictor` contract and a back-off n-gram predictor
// - sampling.rs: Temperature transform and categorical sampling
// - generator.rs: Autoregressive melody generation loop
// - midi.rs: MIDI file output from decoded melodies
// - config.rs: JSON pipeline configuration
// - runtime.rs: One-time logger setup
// - error.rs: Error types for every stage
//
// Generation is deterministic given a seeded RNG.

pub mod config;
pub mod corpus;
pub mod duration;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod generator;
pub mod key;
pub mod midi;
pub mod predictor;
pub mod preprocess;
pub mod runtime;
pub mod sampling;
pub mod score;
pub mod symbol;
pub mod vocab;
