// Melodist CLI entry point.
//
// Two subcommands mirror the two halves of the pipeline:
//
//   preprocess: scores JSON -> per-song encodings, corpus, vocabulary, model
//   generate:   vocabulary + model + seed -> melody text and MIDI file
//
// Usage:
//   cargo run -p melodist_music -- preprocess <scores.json> [--config PATH]
//   cargo run -p melodist_music -- generate [output.mid] [--config PATH]
//     [--seed "67 _ _ _"] [--steps N] [--temperature T] [--rng-seed N]
//
// Paths and tunables come from the JSON config (defaults when omitted).
// Set RUST_LOG=debug for per-stage detail.

use melodist_music::config::PipelineConfig;
use melodist_music::corpus::{Corpus, TrainingSet};
use melodist_music::duration::as_f64;
use melodist_music::generator::{MelodyGenerator, Termination};
use melodist_music::midi::write_midi;
use melodist_music::predictor::NgramPredictor;
use melodist_music::preprocess::preprocess_corpus;
use melodist_music::runtime;
use melodist_music::score::Score;
use melodist_music::vocab::Vocabulary;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

const DEFAULT_SEED: &str = "67 _ _ _ _ _ 65 _ 64 _ 62 _ 60 _ _ _";

fn main() {
    runtime::init();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("preprocess") => run_preprocess(&args),
        Some("generate") => run_generate(&args),
        _ => {
            eprintln!("Usage: melodist <preprocess|generate> [options]");
            eprintln!("  preprocess <scores.json> [--config PATH]");
            eprintln!(
                "  generate [output.mid] [--config PATH] [--seed SYMBOLS] [--steps N] \
                 [--temperature T] [--rng-seed N]"
            );
            std::process::exit(1);
        }
    }
}

fn run_preprocess(args: &[String]) {
    let Some(scores_path) = positional(args) else {
        fail("preprocess needs a scores JSON file");
    };
    let config = load_config(args);

    println!("=== Melodist: preprocess ===");
    println!("Scores: {}", scores_path);
    println!("Time step: {} quarter notes", config.time_step);
    println!("Sequence length: {}", config.sequence_length);
    println!();

    println!("[1/4] Loading scores...");
    let scores = Score::load_all(Path::new(scores_path))
        .unwrap_or_else(|e| fail(&format!("failed to load {}: {}", scores_path, e)));
    println!("  {} scores loaded.", scores.len());

    println!("[2/4] Filtering, normalizing, encoding...");
    let report = preprocess_corpus(&scores, &config);
    println!(
        "  {} accepted, {} skipped.",
        report.songs.len(),
        report.skipped.len()
    );
    if report.songs.is_empty() {
        fail("no songs survived preprocessing");
    }
    if let Err(e) = report.write_songs(&config.dataset_dir) {
        fail(&format!("failed to write {}: {}", config.dataset_dir.display(), e));
    }
    println!("  Songs written to {}/", config.dataset_dir.display());

    println!("[3/4] Assembling corpus and vocabulary...");
    let corpus = Corpus::assemble(&report.encoded_songs(), config.sequence_length);
    if let Err(e) = corpus.save(&config.corpus_path) {
        fail(&format!("failed to write {}: {}", config.corpus_path.display(), e));
    }
    let vocab = corpus.vocabulary();
    if let Err(e) = vocab.save(&config.vocabulary_path) {
        fail(&format!("failed to write {}: {}", config.vocabulary_path.display(), e));
    }
    println!("  Corpus: {} symbols -> {}", corpus.len(), config.corpus_path.display());
    println!("  Vocabulary: {} symbols -> {}", vocab.len(), config.vocabulary_path.display());

    println!("[4/4] Training order-{} n-gram predictor...", config.ngram_order);
    let training = TrainingSet::from_corpus(&corpus, &vocab, config.sequence_length)
        .unwrap_or_else(|e| fail(&e.to_string()));
    let model = NgramPredictor::train(&training.windows, training.vocab_size, config.ngram_order);
    if let Err(e) = model.save(&config.model_path) {
        fail(&format!("failed to write {}: {}", config.model_path.display(), e));
    }
    println!("  {} windows -> {}", training.windows.len(), config.model_path.display());
}

fn run_generate(args: &[String]) {
    let output_path = positional(args).unwrap_or("melody.mid");
    let config = load_config(args);
    let mut params = config.generation.clone();
    if let Some(steps) = parse_flag(args, "--steps") {
        params.num_steps = steps;
    }
    if let Some(temperature) = parse_flag(args, "--temperature") {
        params.temperature = temperature;
    }
    let seed: String = parse_flag(args, "--seed").unwrap_or_else(|| DEFAULT_SEED.to_string());
    let rng_seed: Option<u64> = parse_flag(args, "--rng-seed");

    println!("=== Melodist: generate ===");
    println!("Output: {}", output_path);
    println!("Seed: {}", seed);
    println!("Steps: {}", params.num_steps);
    println!("Temperature: {}", params.temperature);
    if let Some(s) = rng_seed {
        println!("RNG seed: {}", s);
    }
    println!();

    let mut rng = if let Some(s) = rng_seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    println!("[1/4] Loading vocabulary and model...");
    let vocab = Vocabulary::load(&config.vocabulary_path).unwrap_or_else(|e| {
        fail(&format!("failed to load {}: {}", config.vocabulary_path.display(), e))
    });
    let model = NgramPredictor::load(&config.model_path).unwrap_or_else(|e| {
        fail(&format!("failed to load {}: {}", config.model_path.display(), e))
    });
    println!("  Vocabulary: {} symbols, model order {}", vocab.len(), model.order);

    println!("[2/4] Generating...");
    let mut generator = MelodyGenerator::new(model, vocab, config.sequence_length);
    let melody = generator
        .generate_from_text(&seed, &params, &mut rng)
        .unwrap_or_else(|e| fail(&format!("generation failed: {}", e)));
    let reason = match melody.termination {
        Termination::Delimiter => "end of melody sampled",
        Termination::StepLimit => "step limit reached",
    };
    println!("  {} symbols ({})", melody.symbols.len(), reason);
    println!("  {}", melody);

    println!("[3/4] Decoding...");
    let score = melody
        .to_score(params.step_duration)
        .unwrap_or_else(|e| fail(&format!("decoding failed: {}", e)));
    println!(
        "  {} events, {:.2} quarter notes",
        score.events.len(),
        as_f64(score.total_duration())
    );

    println!("[4/4] Writing MIDI to {}...", output_path);
    if let Err(e) = write_midi(&score, params.tempo_bpm, Path::new(output_path)) {
        fail(&format!("error writing MIDI: {}", e));
    }
    println!("  Done!");
    println!();
    println!("Play with: timidity {} (or any MIDI player)", output_path);
}

fn load_config(args: &[String]) -> PipelineConfig {
    match parse_flag::<String>(args, "--config") {
        Some(path) => PipelineConfig::load(Path::new(&path))
            .unwrap_or_else(|e| fail(&format!("bad config {}: {}", path, e))),
        None => PipelineConfig::default(),
    }
}

/// First argument after the subcommand, unless it is a flag.
fn positional(args: &[String]) -> Option<&str> {
    args.get(2)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
