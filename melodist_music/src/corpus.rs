// Corpus assembly and training-window slicing.
//
// All accepted songs are joined into one symbol stream with a run of
// `sequence_length` delimiters between consecutive songs, so any context
// window that spans a song boundary sees at least one delimiter, and the
// model learns an L-long delimiter run as "a new melody starts here". No
// delimiters follow the last song.
//
// Training windows slide over the id-mapped stream with stride 1: for a
// stream of length S and window length L there are exactly S - L windows,
// window i having context ids[i..i+L] and target ids[i+L].

use crate::encoding::EncodedSong;
use crate::error::{DecodeError, VocabularyError};
use crate::symbol::{Symbol, join_symbols, parse_symbols};
use crate::vocab::Vocabulary;
use std::path::Path;

/// The assembled, delimiter-separated symbol stream of a whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corpus {
    symbols: Vec<Symbol>,
}

impl Corpus {
    /// Join songs in order, `separator_length` delimiters between each pair.
    pub fn assemble(songs: &[EncodedSong], separator_length: usize) -> Self {
        let mut symbols = Vec::new();
        for (i, song) in songs.iter().enumerate() {
            if i > 0 {
                symbols.extend(std::iter::repeat_n(Symbol::Delimiter, separator_length));
            }
            symbols.extend_from_slice(song.symbols());
        }
        log::info!(
            "assembled {} songs into a corpus of {} symbols",
            songs.len(),
            symbols.len()
        );
        Corpus { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Build the vocabulary over this corpus.
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::from_symbols(&self.symbols)
    }

    /// Map the whole stream to ids.
    pub fn to_ids(&self, vocab: &Vocabulary) -> Result<Vec<usize>, VocabularyError> {
        vocab.encode(&self.symbols)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, join_symbols(&self.symbols))
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        Ok(Corpus {
            symbols: parse_symbols(text)?,
        })
    }
}

/// One supervised example: `context` predicts `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingWindow {
    pub context: Vec<usize>,
    pub target: usize,
}

/// Slide a window of `sequence_length` over `ids` with stride 1. Yields
/// `ids.len() - sequence_length` windows, or none if the stream is not
/// longer than a window.
pub fn training_windows(ids: &[usize], sequence_length: usize) -> Vec<TrainingWindow> {
    ids.windows(sequence_length + 1)
        .map(|w| TrainingWindow {
            context: w[..sequence_length].to_vec(),
            target: w[sequence_length],
        })
        .collect()
}

/// Flattened `ids.len() x vocab_size` one-hot matrix, row-major. An id
/// outside the vocabulary would leave an all-zero row, so it is an error.
pub fn one_hot(ids: &[usize], vocab_size: usize) -> Result<Vec<f32>, VocabularyError> {
    let mut matrix = vec![0.0; ids.len() * vocab_size];
    for (row, &id) in ids.iter().enumerate() {
        if id >= vocab_size {
            return Err(VocabularyError::InvalidId { id, len: vocab_size });
        }
        matrix[row * vocab_size + id] = 1.0;
    }
    Ok(matrix)
}

/// Everything the external trainer consumes.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub windows: Vec<TrainingWindow>,
    pub vocab_size: usize,
    pub sequence_length: usize,
}

impl TrainingSet {
    pub fn from_corpus(
        corpus: &Corpus,
        vocab: &Vocabulary,
        sequence_length: usize,
    ) -> Result<Self, VocabularyError> {
        let ids = corpus.to_ids(vocab)?;
        let windows = training_windows(&ids, sequence_length);
        log::info!(
            "{} training windows of length {} over a vocabulary of {}",
            windows.len(),
            sequence_length,
            vocab.len()
        );
        Ok(TrainingSet {
            windows,
            vocab_size: vocab.len(),
            sequence_length,
        })
    }

    /// One-hot inputs, one flattened `L x N` matrix per window.
    pub fn one_hot_inputs(&self) -> Result<Vec<Vec<f32>>, VocabularyError> {
        self.windows
            .iter()
            .map(|w| one_hot(&w.context, self.vocab_size))
            .collect()
    }

    pub fn targets(&self) -> Vec<usize> {
        self.windows.iter().map(|w| w.target).collect()
    }
}
