//! Training-run configuration.
//!
//! # Loading Configuration
//!
//! ```
//! use cmdmend_core::config::TrainConfig;
//!
//! // Defaults are always valid.
//! let config = TrainConfig::default();
//! config.validate().expect("default config is valid");
//!
//! // With environment overrides (CMDMEND_-prefixed).
//! let config = TrainConfig::default().with_env_overrides();
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! [pipeline]
//! max_cmd_len = 40
//! padding = "$"
//! level_of_noise = 0.4
//! batch_size = 32
//! inverted = false
//! file_delimiter = "###"
//! reload_policy = "every_batch"
//!
//! [model]
//! input_layers = 2
//! output_layers = 2
//! hidden_layers = 256
//! amount_of_dropout = 0.2
//! steps_per_epoch = 64
//! nb_epoch = 500
//! checkpoint_every = 100
//! ```
//!
//! # Design Principles
//!
//! - **NO GLOBALS**: configuration is an explicit value threaded into every
//!   component constructor.
//! - **FAIL FAST**: file-not-found, parse errors, and out-of-range values
//!   return immediately; nothing silently defaults after loading.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// CORPUS RELOAD POLICY
// ============================================================================

/// When the batch generator re-reads the corpus file.
///
/// Re-reading every batch enables corpus hot-reload at the cost of repeated
/// I/O; caching reads once per generator lifetime. A performance choice,
/// not a correctness one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Re-read the corpus file at the start of every batch.
    #[default]
    EveryBatch,
    /// Read the corpus once and reuse the filtered lines.
    Cached,
}

impl ReloadPolicy {
    /// The policy name as its snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadPolicy::EveryBatch => "every_batch",
            ReloadPolicy::Cached => "cached",
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

/// Configuration for the corruption and encoding pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fixed tensor width; corpus lines longer than this are excluded.
    #[serde(default = "default_max_cmd_len")]
    pub max_cmd_len: usize,

    /// Padding sentinel appended to reach `max_cmd_len`. Need not belong
    /// to the character inventory; the codec encodes it as an all-zero
    /// slot either way.
    #[serde(default = "default_padding")]
    pub padding: char,

    /// Per-sample corruption probability in [0, 1].
    #[serde(rename = "level_of_noise", default = "default_noise_level")]
    pub noise_level: f32,

    /// Commands per generated batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Reverse the corrupted string before encoding (padding moves to the
    /// front of the encoded row; decode must use its inverted mode).
    #[serde(default)]
    pub inverted: bool,

    /// Corpus lines equal to this delimiter are excluded.
    #[serde(default = "default_file_delimiter")]
    pub file_delimiter: String,

    /// Corpus re-read behavior.
    #[serde(default)]
    pub reload_policy: ReloadPolicy,
}

fn default_max_cmd_len() -> usize {
    40
}

fn default_padding() -> char {
    '$'
}

fn default_noise_level() -> f32 {
    0.4
}

fn default_batch_size() -> usize {
    32
}

fn default_file_delimiter() -> String {
    "###".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_cmd_len: default_max_cmd_len(),
            padding: default_padding(),
            noise_level: default_noise_level(),
            batch_size: default_batch_size(),
            inverted: false,
            file_delimiter: default_file_delimiter(),
            reload_policy: ReloadPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_cmd_len == 0 {
            return Err(PipelineError::Config {
                message: "max_cmd_len must be non-zero".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(PipelineError::Config {
                message: "batch_size must be non-zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err(PipelineError::Config {
                message: format!(
                    "level_of_noise must be in [0, 1], got {}",
                    self.noise_level
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// MODEL CONFIG
// ============================================================================

/// Configuration for the correction network and training loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Stacked recurrent layers on the encoder side.
    #[serde(default = "default_input_layers")]
    pub input_layers: usize,

    /// Stacked recurrent layers on the decoder side.
    #[serde(default = "default_output_layers")]
    pub output_layers: usize,

    /// Width of each recurrent layer (the historical option name).
    #[serde(rename = "hidden_layers", default = "default_hidden_units")]
    pub hidden_units: usize,

    /// Dropout probability after each recurrent layer, in [0, 1).
    #[serde(rename = "amount_of_dropout", default = "default_dropout")]
    pub dropout: f32,

    /// Optimizer steps per epoch.
    #[serde(default = "default_steps_per_epoch")]
    pub steps_per_epoch: usize,

    /// Total epochs to train.
    #[serde(rename = "nb_epoch", default = "default_epochs")]
    pub epochs: usize,

    /// Write a checkpoint every this many epochs.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

fn default_input_layers() -> usize {
    2
}

fn default_output_layers() -> usize {
    2
}

fn default_hidden_units() -> usize {
    256
}

fn default_dropout() -> f32 {
    0.2
}

fn default_steps_per_epoch() -> usize {
    64
}

fn default_epochs() -> usize {
    500
}

fn default_checkpoint_every() -> usize {
    100
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_layers: default_input_layers(),
            output_layers: default_output_layers(),
            hidden_units: default_hidden_units(),
            dropout: default_dropout(),
            steps_per_epoch: default_steps_per_epoch(),
            epochs: default_epochs(),
            checkpoint_every: default_checkpoint_every(),
        }
    }
}

impl ModelConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.input_layers == 0 || self.output_layers == 0 {
            return Err(PipelineError::Config {
                message: "input_layers and output_layers must be non-zero".to_string(),
            });
        }
        if self.hidden_units == 0 {
            return Err(PipelineError::Config {
                message: "hidden_layers must be non-zero".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(PipelineError::Config {
                message: format!("amount_of_dropout must be in [0, 1), got {}", self.dropout),
            });
        }
        if self.steps_per_epoch == 0 || self.checkpoint_every == 0 {
            return Err(PipelineError::Config {
                message: "steps_per_epoch and checkpoint_every must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// ROOT TRAIN CONFIG
// ============================================================================

/// Root configuration for a training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Corruption and encoding pipeline.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Network and training loop.
    #[serde(default)]
    pub model: ModelConfig,
}

impl TrainConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> PipelineResult<Self> {
        toml::from_str(contents).map_err(|e| PipelineError::Config {
            message: format!("failed to parse TOML config: {e}"),
        })
    }

    /// Validate every section together.
    pub fn validate(&self) -> PipelineResult<()> {
        self.pipeline.validate()?;
        self.model.validate()
    }

    /// Apply `CMDMEND_`-prefixed environment overrides.
    ///
    /// Recognized: `CMDMEND_LEVEL_OF_NOISE`, `CMDMEND_BATCH_SIZE`,
    /// `CMDMEND_NB_EPOCH`. Unparseable values are ignored; `validate`
    /// still applies afterwards.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(noise) = env_parse::<f32>("CMDMEND_LEVEL_OF_NOISE") {
            self.pipeline.noise_level = noise;
        }
        if let Some(batch) = env_parse::<usize>("CMDMEND_BATCH_SIZE") {
            self.pipeline.batch_size = batch;
        }
        if let Some(epochs) = env_parse::<usize>("CMDMEND_NB_EPOCH") {
            self.model.epochs = epochs;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}
