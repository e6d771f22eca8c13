// Batch preprocessing: scores in, encoded songs out.
//
// Each song goes through the duration filter, key normalization, and
// time-series encoding independently, so the batch runs in parallel with
// rayon. Results are collected in input order so corpus assembly (and hence
// the vocabulary) does not depend on thread scheduling.
//
// A song that fails any stage is skipped and reported; the batch continues.

use crate::config::PipelineConfig;
use crate::duration::QuarterLength;
use crate::encoding::{EncodedSong, encode_song};
use crate::error::SongError;
use crate::filter::check_durations;
use crate::key::normalize;
use crate::score::Score;
use rayon::prelude::*;
use std::path::Path;

/// Outcome of preprocessing a batch of scores.
#[derive(Debug, Clone, Default)]
pub struct PreprocessReport {
    /// Accepted songs with their index in the input batch.
    pub songs: Vec<(usize, EncodedSong)>,
    /// Rejected songs with their index and the reason.
    pub skipped: Vec<(usize, SongError)>,
}

impl PreprocessReport {
    /// Accepted songs in input order.
    pub fn encoded_songs(&self) -> Vec<EncodedSong> {
        self.songs.iter().map(|(_, song)| song.clone()).collect()
    }

    /// Write each accepted song to `dir/<input index>`.
    pub fn write_songs(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        for (index, song) in &self.songs {
            std::fs::write(dir.join(index.to_string()), song.to_string())?;
        }
        Ok(())
    }
}

/// Filter, normalize, and encode a single song.
pub fn preprocess_song(
    score: &Score,
    time_step: QuarterLength,
    accepted_durations: &[QuarterLength],
) -> Result<EncodedSong, SongError> {
    check_durations(score, accepted_durations)?;
    let normalized = normalize(score)?;
    Ok(encode_song(&normalized, time_step)?)
}

/// Preprocess a batch. Never fails as a whole; see `PreprocessReport::skipped`.
pub fn preprocess_corpus(scores: &[Score], config: &PipelineConfig) -> PreprocessReport {
    let results: Vec<(usize, Result<EncodedSong, SongError>)> = scores
        .par_iter()
        .enumerate()
        .map(|(i, score)| {
            (
                i,
                preprocess_song(score, config.time_step, &config.accepted_durations),
            )
        })
        .collect();

    let mut report = PreprocessReport::default();
    for (i, result) in results {
        match result {
            Ok(song) => report.songs.push((i, song)),
            Err(e) => {
                log::warn!("skipping song {i}: {e}");
                report.skipped.push((i, e));
            }
        }
    }
    log::info!(
        "preprocessed {} songs: {} accepted, {} skipped",
        scores.len(),
        report.songs.len(),
        report.skipped.len()
    );
    report
}
