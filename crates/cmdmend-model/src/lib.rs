//! Recurrent correction model for the cmdmend pipeline.
//!
//! Consumes the `(X, y)` one-hot batches produced by `cmdmend-core` and
//! owns everything tensor-shaped: the network, the training loop,
//! checkpoint persistence, and the end-of-epoch sample preview.
//!
//! # Modules
//!
//! - [`net`]: GRU encoder/decoder with a time-distributed dense head
//! - [`trainer`]: MSE + AdamW epoch loop
//! - [`checkpoint`]: safetensors save/load
//! - [`preview`]: human-readable correction samples

pub mod checkpoint;
pub mod error;
pub mod net;
pub mod preview;
pub mod trainer;

pub use error::{ModelError, ModelResult};
pub use net::{batch_to_tensor, CorrectionNet};
pub use trainer::Trainer;
