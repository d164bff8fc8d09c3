//! Training loop.
//!
//! Pulls batches from the pipeline's infinite generator, steps an AdamW
//! optimizer against MSE loss, previews a few corrections at the end of
//! every epoch, and writes periodic checkpoints. Generator errors are
//! fatal and abort the run.

use std::path::PathBuf;

use candle_core::Device;
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW};
use tracing::{debug, info};

use cmdmend_core::{FixedWidthCodec, PipelineResult, TrainConfig, TrainingBatch};

use crate::checkpoint;
use crate::error::{ModelError, ModelResult};
use crate::net::{batch_to_tensor, CorrectionNet};
use crate::preview;

/// Rows decoded in the end-of-epoch preview.
const PREVIEW_ROWS: usize = 10;

/// Drives training of a [`CorrectionNet`].
pub struct Trainer<'a> {
    net: CorrectionNet,
    config: &'a TrainConfig,
    device: Device,
    models_dir: PathBuf,
    learning_rate: f64,
}

impl<'a> Trainer<'a> {
    /// New trainer writing checkpoints under `models_dir`.
    pub fn new(
        net: CorrectionNet,
        config: &'a TrainConfig,
        device: Device,
        models_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            net,
            config,
            device,
            models_dir: models_dir.into(),
            learning_rate: 1e-3,
        }
    }

    /// Override the optimizer learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// The net being trained.
    pub fn net(&self) -> &CorrectionNet {
        &self.net
    }

    /// Restore weights from an earlier checkpoint before training.
    pub fn resume_from(&self, path: &std::path::Path) -> ModelResult<()> {
        checkpoint::load(&self.net, path, &self.device)
    }

    /// Run the configured number of epochs against `batches`.
    pub fn train<G>(&mut self, batches: &mut G, codec: &FixedWidthCodec<'_>) -> ModelResult<()>
    where
        G: Iterator<Item = PipelineResult<TrainingBatch>>,
    {
        let params = ParamsAdamW {
            lr: self.learning_rate,
            ..ParamsAdamW::default()
        };
        let mut optimizer = AdamW::new(self.net.trainable_vars(), params)?;

        let steps = self.config.model.steps_per_epoch;
        info!(
            epochs = self.config.model.epochs,
            steps_per_epoch = steps,
            params = self.net.num_params(),
            "starting training"
        );

        for epoch in 0..self.config.model.epochs {
            let mut loss_sum = 0f64;
            for step in 0..steps {
                let batch = next_batch(batches)?;
                let x = batch_to_tensor(&batch.inputs, &self.device)?;
                let y = batch_to_tensor(&batch.targets, &self.device)?;

                let preds = self.net.forward(&x, true)?;
                let loss = loss::mse(&preds, &y)?;
                optimizer.backward_step(&loss)?;

                let value = loss.to_scalar::<f32>()?;
                loss_sum += f64::from(value);
                debug!(epoch, step, loss = value, "training step");
            }
            info!(
                epoch,
                mean_loss = loss_sum / steps as f64,
                "epoch complete"
            );

            let batch = next_batch(batches)?;
            preview::log_samples(
                &self.net,
                codec,
                &batch,
                self.config.pipeline.inverted,
                PREVIEW_ROWS,
                &self.device,
            )?;

            if epoch % self.config.model.checkpoint_every == 0 {
                checkpoint::save(&self.net, &self.models_dir, epoch)?;
            }
        }
        Ok(())
    }
}

fn next_batch<G>(batches: &mut G) -> ModelResult<TrainingBatch>
where
    G: Iterator<Item = PipelineResult<TrainingBatch>>,
{
    Ok(batches.next().ok_or(ModelError::BatchSourceEnded)??)
}

#[cfg(test)]
mod tests {
    use cmdmend_core::{
        BatchGenerator, CharInventory, ModelConfig, PipelineConfig, SeededNoise, VocabTrie,
    };
    use std::io::Write;

    use super::*;

    #[test]
    fn test_short_training_run_writes_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        let mut f = std::fs::File::create(&corpus).unwrap();
        writeln!(f, "ls -l").unwrap();
        writeln!(f, "cd").unwrap();
        drop(f);

        let inventory = CharInventory::from_chars("abcdefghijklmnopqrstuvwxyz -".chars());
        let trie = VocabTrie::from_entries(["ls", "cd"]);
        let config = TrainConfig {
            pipeline: PipelineConfig {
                max_cmd_len: 8,
                batch_size: 4,
                noise_level: 0.5,
                ..PipelineConfig::default()
            },
            model: ModelConfig {
                input_layers: 1,
                output_layers: 1,
                hidden_units: 8,
                dropout: 0.0,
                steps_per_epoch: 2,
                epochs: 1,
                checkpoint_every: 1,
                ..ModelConfig::default()
            },
        };

        let device = Device::Cpu;
        let net = CorrectionNet::new(&config.model, inventory.len(), 8, &device).unwrap();
        let models_dir = dir.path().join("models");
        let mut trainer = Trainer::new(net, &config, device, &models_dir);

        let mut generator = BatchGenerator::new(
            &inventory,
            &trie,
            &corpus,
            &config.pipeline,
            SeededNoise::from_seed(1),
        );
        let codec = FixedWidthCodec::new(&inventory);

        trainer.train(&mut generator, &codec).unwrap();
        assert!(checkpoint::checkpoint_path(&models_dir, 0).exists());
    }

    #[test]
    fn test_generator_error_aborts_training() {
        let dir = tempfile::tempdir().unwrap();
        // Corpus where nothing survives filtering.
        let corpus = dir.path().join("corpus.txt");
        let mut f = std::fs::File::create(&corpus).unwrap();
        writeln!(f, "a command far too long for the configured width").unwrap();
        drop(f);

        let inventory = CharInventory::from_chars("abc".chars());
        let trie = VocabTrie::from_entries(["a"]);
        let config = TrainConfig {
            pipeline: PipelineConfig {
                max_cmd_len: 8,
                batch_size: 2,
                ..PipelineConfig::default()
            },
            model: ModelConfig {
                input_layers: 1,
                output_layers: 1,
                hidden_units: 4,
                dropout: 0.0,
                steps_per_epoch: 1,
                epochs: 1,
                ..ModelConfig::default()
            },
        };

        let device = Device::Cpu;
        let net = CorrectionNet::new(&config.model, inventory.len(), 8, &device).unwrap();
        let mut trainer = Trainer::new(net, &config, device, dir.path().join("models"));

        let mut generator = BatchGenerator::new(
            &inventory,
            &trie,
            &corpus,
            &config.pipeline,
            SeededNoise::from_seed(1),
        );
        let codec = FixedWidthCodec::new(&inventory);

        assert!(trainer.train(&mut generator, &codec).is_err());
    }
}
