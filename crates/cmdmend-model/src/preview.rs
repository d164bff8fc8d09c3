//! End-of-epoch sample preview.
//!
//! Decodes a handful of rows from a batch — the misspelled input, the true
//! command, and the model's current correction — and logs them, giving a
//! human-readable read on training progress.

use candle_core::Device;
use rand::seq::index::sample;
use tracing::info;

use cmdmend_core::{FixedWidthCodec, TrainingBatch};

use crate::error::ModelResult;
use crate::net::{batch_to_tensor, CorrectionNet};

/// Decode and log up to `count` random rows of `batch`.
///
/// When the pipeline runs inverted, input rows were encoded reversed; they
/// are decoded through the codec's inverted mode and un-reversed for
/// display.
pub fn log_samples(
    net: &CorrectionNet,
    codec: &FixedWidthCodec<'_>,
    batch: &TrainingBatch,
    inverted: bool,
    count: usize,
    device: &Device,
) -> ModelResult<()> {
    let (rows, _, _) = batch.inputs.dims();
    if rows == 0 || count == 0 {
        return Ok(());
    }

    let x = batch_to_tensor(&batch.inputs, device)?;
    let classes = net.predict_classes(&x)?;

    let mut rng = rand::thread_rng();
    for row in sample(&mut rng, rows, count.min(rows)) {
        let truth = codec.decode_one_hot(batch.targets.row(row), false);
        let corrected = codec.decode_indices(&classes[row]);
        let misspelled = if inverted {
            codec
                .decode_one_hot(batch.inputs.row(row), true)
                .chars()
                .rev()
                .collect()
        } else {
            codec.decode_one_hot(batch.inputs.row(row), false)
        };
        info!(
            misspelled = %misspelled,
            truth = %truth,
            corrected = %corrected,
            "sample correction"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cmdmend_core::{
        BatchGenerator, CharInventory, ModelConfig, PipelineConfig, SeededNoise, VocabTrie,
    };
    use std::io::Write;

    use super::*;

    #[test]
    fn test_preview_decodes_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        let mut f = std::fs::File::create(&corpus).unwrap();
        writeln!(f, "ls -l").unwrap();
        writeln!(f, "git push").unwrap();
        drop(f);

        let inventory = CharInventory::from_chars("abcdefghijklmnopqrstuvwxyz -".chars());
        let trie = VocabTrie::from_entries(["ls", "git"]);
        let pipeline = PipelineConfig {
            max_cmd_len: 10,
            batch_size: 4,
            noise_level: 1.0,
            ..PipelineConfig::default()
        };
        let mut generator = BatchGenerator::new(
            &inventory,
            &trie,
            &corpus,
            &pipeline,
            SeededNoise::from_seed(5),
        );
        let codec = FixedWidthCodec::new(&inventory);

        let device = Device::Cpu;
        let model = ModelConfig {
            input_layers: 1,
            output_layers: 1,
            hidden_units: 8,
            dropout: 0.0,
            ..ModelConfig::default()
        };
        let net = CorrectionNet::new(&model, inventory.len(), 10, &device).unwrap();

        let batch = generator.next_batch().unwrap();
        log_samples(&net, &codec, &batch, false, 10, &device).unwrap();
        // More requested rows than the batch holds is fine.
        log_samples(&net, &codec, &batch, false, 100, &device).unwrap();
    }
}
