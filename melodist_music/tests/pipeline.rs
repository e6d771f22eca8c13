// End-to-end tests for the melody pipeline.
//
// Runs the same path as the CLI, with real files in a scratch directory:
// scores JSON -> preprocess -> corpus + vocabulary -> training windows ->
// n-gram predictor -> generation -> decode -> MIDI.

use std::path::PathBuf;

use melodist_music::config::{GenerationParams, PipelineConfig};
use melodist_music::corpus::{Corpus, TrainingSet};
use melodist_music::duration::ql;
use melodist_music::generator::{MelodyGenerator, Termination};
use melodist_music::midi::write_midi;
use melodist_music::predictor::NgramPredictor;
use melodist_music::preprocess::preprocess_corpus;
use melodist_music::runtime;
use melodist_music::score::Score;
use melodist_music::symbol::Symbol;
use melodist_music::vocab::Vocabulary;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Short windows keep the corpus small.
const SEQUENCE_LENGTH: usize = 8;

/// Four songs as the score parser would emit them: C major, G major (to be
/// transposed down to C), A minor, and one with a triplet that the duration
/// filter must reject.
const SCORES_JSON: &str = r#"[
    {"key": {"tonic": 0, "mode": "major"}, "events": [
        {"type": "note", "pitch": 60, "duration": "1/2"},
        {"type": "note", "pitch": 62, "duration": "1/2"},
        {"type": "note", "pitch": 64, "duration": "1"},
        {"type": "rest", "duration": "1/2"},
        {"type": "note", "pitch": 67, "duration": "3/2"}
    ]},
    {"key": {"tonic": 7, "mode": "major"}, "events": [
        {"type": "note", "pitch": 67, "duration": "1"},
        {"type": "note", "pitch": 71, "duration": "1/2"},
        {"type": "note", "pitch": 74, "duration": "1/2"},
        {"type": "note", "pitch": 72, "duration": "2"}
    ]},
    {"key": {"tonic": 9, "mode": "minor"}, "events": [
        {"type": "note", "pitch": 69, "duration": "3/4"},
        {"type": "note", "pitch": 72, "duration": "1/4"},
        {"type": "rest", "duration": "1"},
        {"type": "note", "pitch": 64, "duration": "2"}
    ]},
    {"key": {"tonic": 0, "mode": "major"}, "events": [
        {"type": "note", "pitch": 60, "duration": "1/3"},
        {"type": "note", "pitch": 62, "duration": "1/3"},
        {"type": "note", "pitch": 64, "duration": "1/3"}
    ]}
]"#;

/// Per-test scratch directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("melodist-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        sequence_length: SEQUENCE_LENGTH,
        dataset_dir: dir.join("dataset"),
        corpus_path: dir.join("file_dataset"),
        vocabulary_path: dir.join("mapping.json"),
        model_path: dir.join("model.json"),
        ngram_order: 3,
        ..PipelineConfig::default()
    }
}

/// Runs the preprocess half and returns the config pointing at its outputs.
fn build_artifacts(dir: &std::path::Path) -> PipelineConfig {
    let config = config_in(dir);
    let scores_path = dir.join("scores.json");
    std::fs::write(&scores_path, SCORES_JSON).unwrap();

    let scores = Score::load_all(&scores_path).unwrap();
    let report = preprocess_corpus(&scores, &config);
    assert_eq!(report.songs.len(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, 3);
    report.write_songs(&config.dataset_dir).unwrap();

    let corpus = Corpus::assemble(&report.encoded_songs(), config.sequence_length);
    corpus.save(&config.corpus_path).unwrap();
    let vocab = corpus.vocabulary();
    vocab.save(&config.vocabulary_path).unwrap();

    let training = TrainingSet::from_corpus(&corpus, &vocab, config.sequence_length).unwrap();
    assert_eq!(training.windows.len(), corpus.len() - SEQUENCE_LENGTH);
    NgramPredictor::train(&training.windows, training.vocab_size, config.ngram_order)
        .save(&config.model_path)
        .unwrap();
    config
}

#[test]
fn preprocess_writes_normalized_songs_and_corpus() {
    runtime::init();
    let dir = scratch_dir("preprocess");
    let config = build_artifacts(&dir);

    // The G major song lands in C: 67 -> 60, 71 -> 64, 74 -> 67, 72 -> 65.
    let g_song = std::fs::read_to_string(config.dataset_dir.join("1")).unwrap();
    assert_eq!(g_song, "60 _ _ _ 64 _ 67 _ 65 _ _ _ _ _ _ _");
    // Rejected songs get no file.
    assert!(!config.dataset_dir.join("3").exists());

    // Separator runs of L delimiters sit between songs only.
    let corpus = Corpus::load(&config.corpus_path).unwrap();
    let delimiters = corpus
        .symbols()
        .iter()
        .filter(|&&s| s == Symbol::Delimiter)
        .count();
    assert_eq!(delimiters, 2 * SEQUENCE_LENGTH);
    assert_ne!(corpus.symbols().last(), Some(&Symbol::Delimiter));

    // The saved vocabulary reloads to the same mapping.
    let vocab = Vocabulary::load(&config.vocabulary_path).unwrap();
    assert_eq!(vocab, corpus.vocabulary());
    assert_eq!(vocab.symbol_of(vocab.delimiter_id()).unwrap(), Symbol::Delimiter);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn generate_decode_and_write_midi() {
    runtime::init();
    let dir = scratch_dir("generate");
    let config = build_artifacts(&dir);

    let vocab = Vocabulary::load(&config.vocabulary_path).unwrap();
    let model = NgramPredictor::load(&config.model_path).unwrap();
    let mut generator = MelodyGenerator::new(model, vocab, config.sequence_length);
    let params = GenerationParams {
        num_steps: 40,
        max_context_length: SEQUENCE_LENGTH,
        temperature: 0.8,
        ..GenerationParams::default()
    };

    let seed = "60 _ 62 _";
    let mut rng = StdRng::seed_from_u64(2024);
    let melody = generator.generate_from_text(seed, &params, &mut rng).unwrap();

    assert!(melody.to_string().starts_with(seed));
    assert!(!melody.symbols.contains(&Symbol::Delimiter));
    assert!(melody.symbols.len() >= 4 && melody.symbols.len() <= 4 + params.num_steps);
    assert_eq!(
        melody.termination == Termination::StepLimit,
        melody.symbols.len() == 4 + params.num_steps
    );

    // Same RNG seed, same melody.
    let mut rng = StdRng::seed_from_u64(2024);
    let again = generator.generate_from_text(seed, &params, &mut rng).unwrap();
    assert_eq!(again, melody);

    let score = melody.to_score(params.step_duration).unwrap();
    let slots = u32::try_from(melody.symbols.len()).unwrap();
    assert_eq!(score.total_duration(), ql(slots, 4));

    let midi_path = dir.join("melody.mid");
    write_midi(&score, params.tempo_bpm, &midi_path).unwrap();
    let bytes = std::fs::read(&midi_path).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn seed_outside_vocabulary_is_rejected() {
    let dir = scratch_dir("unknown-seed");
    let config = build_artifacts(&dir);

    let vocab = Vocabulary::load(&config.vocabulary_path).unwrap();
    let model = NgramPredictor::load(&config.model_path).unwrap();
    let mut generator = MelodyGenerator::new(model, vocab, config.sequence_length);
    let mut rng = StdRng::seed_from_u64(1);

    // 90 never occurs in the corpus.
    let result = generator.generate_from_text("60 _ 90", &GenerationParams::default(), &mut rng);
    assert!(result.is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}
