//! Infinite training-batch generation.
//!
//! The generator is a pull-driven, never-ending source of `(X, y)` pairs:
//! corpus line → mistake injection → padding (and optional reversal) →
//! one-hot encoding. The caller owns termination; the generator only stops
//! on a fatal error (unreadable corpus, empty filtered corpus, or a
//! padded-length invariant violation).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{EncodedBatch, FixedWidthCodec};
use crate::config::{PipelineConfig, ReloadPolicy};
use crate::corrupt::MistakeInjector;
use crate::error::{PipelineError, PipelineResult};
use crate::inventory::CharInventory;
use crate::rng::NoiseSource;
use crate::vocab::PrefixLookup;

/// One (misspelled, true) command pair before padding, kept for preview
/// and logging.
#[derive(Debug, Clone)]
pub struct SamplePair {
    /// The corrupted command as the injector produced it.
    pub misspelled: String,
    /// The clean command drawn from the corpus.
    pub truth: String,
}

/// One training step's worth of encoded data.
#[derive(Debug, Clone)]
pub struct TrainingBatch {
    /// Corrupted commands, padded (and reversed when `inverted` is set),
    /// encoded as `(batch_size, max_cmd_len, alphabet)`.
    pub inputs: EncodedBatch,
    /// True commands, padded, same shape.
    pub targets: EncodedBatch,
    /// The raw string pairs behind the rows, in row order.
    pub pairs: Vec<SamplePair>,
}

/// Unbounded, restartable source of training batches.
///
/// Implements `Iterator` with `Result` items: the sequence never ends on
/// its own, and an `Err` item means the run must stop.
pub struct BatchGenerator<'a, L, R> {
    config: PipelineConfig,
    codec: FixedWidthCodec<'a>,
    injector: MistakeInjector<'a>,
    lookup: &'a L,
    corpus_path: PathBuf,
    rng: R,
    lines: Vec<String>,
}

impl<'a, L: PrefixLookup, R: NoiseSource> BatchGenerator<'a, L, R> {
    /// New generator over the corpus at `corpus_path`.
    pub fn new(
        inventory: &'a CharInventory,
        lookup: &'a L,
        corpus_path: impl AsRef<Path>,
        config: &PipelineConfig,
        rng: R,
    ) -> Self {
        Self {
            config: config.clone(),
            codec: FixedWidthCodec::new(inventory),
            injector: MistakeInjector::new(inventory, config.noise_level),
            lookup,
            corpus_path: corpus_path.as_ref().to_path_buf(),
            rng,
            lines: Vec::new(),
        }
    }

    /// Produce the next `(X, y)` batch.
    pub fn next_batch(&mut self) -> PipelineResult<TrainingBatch> {
        if self.config.reload_policy == ReloadPolicy::EveryBatch || self.lines.is_empty() {
            self.lines = read_filtered(&self.corpus_path, &self.config)?;
        }
        if self.lines.is_empty() {
            return Err(PipelineError::EmptyCorpus {
                max_cmd_len: self.config.max_cmd_len,
            });
        }

        let max_len = self.config.max_cmd_len;
        let mut misspelled = Vec::with_capacity(self.config.batch_size);
        let mut truths = Vec::with_capacity(self.config.batch_size);
        let mut pairs = Vec::with_capacity(self.config.batch_size);

        for _ in 0..self.config.batch_size {
            let draw = self.rng.index(self.lines.len());
            let command = self.lines[draw].clone();
            let noisy = self.injector.inject(&command, self.lookup, &mut self.rng);

            let padded_truth = pad(&command, self.config.padding, max_len);
            let truth_len = padded_truth.chars().count();
            if truth_len != max_len {
                return Err(PipelineError::PaddedLength {
                    expected: max_len,
                    actual: truth_len,
                });
            }

            let mut padded_noisy = pad(&noisy, self.config.padding, max_len);
            if self.config.inverted {
                padded_noisy = padded_noisy.chars().rev().collect();
            }

            misspelled.push(padded_noisy);
            truths.push(padded_truth);
            pairs.push(SamplePair {
                misspelled: noisy,
                truth: command,
            });
        }

        let inputs = self.codec.encode(&misspelled, max_len);
        let targets = self.codec.encode(&truths, max_len);
        Ok(TrainingBatch {
            inputs,
            targets,
            pairs,
        })
    }
}

impl<'a, L: PrefixLookup, R: NoiseSource> Iterator for BatchGenerator<'a, L, R> {
    type Item = PipelineResult<TrainingBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}

/// Right-pad `command` with the sentinel to `max_len` characters.
///
/// A command already at or beyond `max_len` is returned as-is; the encoder
/// drops any overflow.
fn pad(command: &str, sentinel: char, max_len: usize) -> String {
    let len = command.chars().count();
    let mut padded = command.to_string();
    padded.extend(std::iter::repeat(sentinel).take(max_len.saturating_sub(len)));
    padded
}

/// Read the corpus, excluding delimiter lines, empty lines, and lines
/// longer than `max_cmd_len` characters (excluded, never truncated).
fn read_filtered(path: &Path, config: &PipelineConfig) -> PipelineResult<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line == config.file_delimiter {
            continue;
        }
        if line.chars().count() > config.max_cmd_len {
            dropped += 1;
            continue;
        }
        kept.push(line.to_string());
    }
    debug!(
        path = %path.display(),
        kept = kept.len(),
        dropped,
        "read corpus"
    );
    Ok(kept)
}
