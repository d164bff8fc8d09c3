//! Corruption and encode/decode pipeline for shell-command spelling
//! correction.
//!
//! This crate turns a corpus of clean shell commands into an endless stream
//! of `(misspelled, true)` tensor batches for a character-level correction
//! model:
//!
//! ```text
//! corpus lines ──> MistakeInjector ──> (misspelled, true) pair
//!                                            │
//!                                 padding / optional reversal
//!                                            │
//!                                   FixedWidthCodec.encode
//!                                            │
//!                                  (X, y) one-hot batches
//! ```
//!
//! # Modules
//!
//! - [`inventory`]: the sorted character alphabet derived from the vocabulary
//! - [`vocab`]: longest-prefix lookup over the vocabulary
//! - [`corrupt`]: synthetic typing-mistake injection
//! - [`codec`]: fixed-width one-hot encoding and decoding
//! - [`generator`]: the infinite batch source
//! - [`config`]: TOML configuration
//! - [`rng`]: injectable randomness

pub mod codec;
pub mod config;
pub mod corrupt;
pub mod error;
pub mod generator;
pub mod inventory;
pub mod rng;
pub mod vocab;

pub use codec::{EncodedBatch, FixedWidthCodec};
pub use config::{ModelConfig, PipelineConfig, ReloadPolicy, TrainConfig};
pub use corrupt::{MistakeInjector, MistakeKind};
pub use error::{PipelineError, PipelineResult};
pub use generator::{BatchGenerator, SamplePair, TrainingBatch};
pub use inventory::CharInventory;
pub use rng::{NoiseSource, ScriptedNoise, SeededNoise};
pub use vocab::{PrefixLookup, VocabTrie};
