//! Checkpoint persistence.
//!
//! Weights are written as safetensors files named by epoch,
//! `correction_e{epoch}.safetensors`, into a models directory that is
//! created on first use. Loading restores into an already-constructed net;
//! a missing tensor or shape mismatch is a [`ModelError::Checkpoint`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use tracing::info;

use crate::error::{ModelError, ModelResult};
use crate::net::CorrectionNet;

/// Checkpoint file path for an epoch.
#[must_use]
pub fn checkpoint_path(dir: &Path, epoch: usize) -> PathBuf {
    dir.join(format!("correction_e{epoch}.safetensors"))
}

/// Save the net's weights for `epoch` under `dir`.
pub fn save(net: &CorrectionNet, dir: &Path, epoch: usize) -> ModelResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = checkpoint_path(dir, epoch);
    let tensors: HashMap<String, Tensor> = net
        .named_vars()
        .into_iter()
        .map(|(name, var)| (name, var.as_tensor().clone()))
        .collect();
    candle_core::safetensors::save(&tensors, &path)?;
    info!(path = %path.display(), epoch, "saved checkpoint");
    Ok(path)
}

/// Restore weights from a checkpoint file into `net`.
pub fn load(net: &CorrectionNet, path: &Path, device: &Device) -> ModelResult<()> {
    let tensors = candle_core::safetensors::load(path, device)?;
    for (name, var) in net.named_vars() {
        let tensor = tensors.get(&name).ok_or_else(|| ModelError::Checkpoint {
            message: format!("missing tensor '{name}' in '{}'", path.display()),
        })?;
        var.set(tensor).map_err(|e| ModelError::Checkpoint {
            message: format!("tensor '{name}' does not fit the net: {e}"),
        })?;
    }
    info!(path = %path.display(), "restored checkpoint");
    Ok(())
}
