//! Recurrent correction network.
//!
//! Architecture, mirroring the classic character-level sequence-to-sequence
//! corrector:
//!
//! ```text
//! (batch, max_cmd_len, alphabet)
//!        │
//!   GRU × input_layers      (last layer's final state only)
//!        │
//!   repeat across max_cmd_len steps
//!        │
//!   GRU × output_layers     (full sequences)
//!        │
//!   time-distributed dense → ReLU
//!        │
//! (batch, max_cmd_len, alphabet)
//! ```
//!
//! Dropout follows every recurrent layer and is active only in training
//! mode. Parameters are plain [`Var`]s with deterministic initialization,
//! so two nets built from the same configuration start identical.

use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::ops;

use cmdmend_core::{EncodedBatch, ModelConfig};

use crate::error::ModelResult;

/// Copy an encoded batch onto a device as an f32 tensor.
pub fn batch_to_tensor(batch: &EncodedBatch, device: &Device) -> ModelResult<Tensor> {
    Ok(Tensor::from_slice(batch.as_slice(), batch.dims(), device)?)
}

/// Deterministic Xavier-style init: a low-discrepancy sequence scaled to
/// the layer's fan-in/fan-out.
fn init_matrix(rows: usize, cols: usize, salt: f32, device: &Device) -> ModelResult<Var> {
    let std = (2.0 / (rows + cols) as f64).sqrt() as f32;
    let data: Vec<f32> = (0..rows * cols)
        .map(|i| (((i as f32).mul_add(0.618_034, salt)) % 1.0 * 2.0 - 1.0) * std)
        .collect();
    Ok(Var::from_tensor(&Tensor::from_slice(
        &data,
        (rows, cols),
        device,
    )?)?)
}

fn init_bias(len: usize, device: &Device) -> ModelResult<Var> {
    Ok(Var::from_tensor(&Tensor::zeros(
        (len,),
        DType::F32,
        device,
    )?)?)
}

/// One GRU layer: three input projections, three recurrent projections,
/// three biases.
struct GruLayer {
    w_z: Var,
    u_z: Var,
    b_z: Var,
    w_r: Var,
    u_r: Var,
    b_r: Var,
    w_h: Var,
    u_h: Var,
    b_h: Var,
    hidden: usize,
}

impl GruLayer {
    fn new(input_dim: usize, hidden: usize, salt: f32, device: &Device) -> ModelResult<Self> {
        Ok(Self {
            w_z: init_matrix(input_dim, hidden, salt + 0.11, device)?,
            u_z: init_matrix(hidden, hidden, salt + 0.23, device)?,
            b_z: init_bias(hidden, device)?,
            w_r: init_matrix(input_dim, hidden, salt + 0.37, device)?,
            u_r: init_matrix(hidden, hidden, salt + 0.53, device)?,
            b_r: init_bias(hidden, device)?,
            w_h: init_matrix(input_dim, hidden, salt + 0.71, device)?,
            u_h: init_matrix(hidden, hidden, salt + 0.89, device)?,
            b_h: init_bias(hidden, device)?,
            hidden,
        })
    }

    /// One timestep: `x_t` is `(batch, input)`, `h` is `(batch, hidden)`.
    fn step(&self, x_t: &Tensor, h: &Tensor) -> ModelResult<Tensor> {
        let z = ops::sigmoid(
            &x_t.matmul(self.w_z.as_tensor())?
                .add(&h.matmul(self.u_z.as_tensor())?)?
                .broadcast_add(self.b_z.as_tensor())?,
        )?;
        let r = ops::sigmoid(
            &x_t.matmul(self.w_r.as_tensor())?
                .add(&h.matmul(self.u_r.as_tensor())?)?
                .broadcast_add(self.b_r.as_tensor())?,
        )?;
        let candidate = x_t
            .matmul(self.w_h.as_tensor())?
            .add(&r.mul(h)?.matmul(self.u_h.as_tensor())?)?
            .broadcast_add(self.b_h.as_tensor())?
            .tanh()?;

        // h' = (1 - z) * h + z * candidate
        let keep = z.affine(-1.0, 1.0)?.mul(h)?;
        Ok(keep.add(&z.mul(&candidate)?)?)
    }

    /// Full sequence: `(batch, len, input)` → `(batch, len, hidden)`.
    fn seq(&self, xs: &Tensor) -> ModelResult<Tensor> {
        let (batch, len, _) = xs.dims3()?;
        let mut h = Tensor::zeros((batch, self.hidden), DType::F32, xs.device())?;
        let mut states = Vec::with_capacity(len);
        for t in 0..len {
            let x_t = xs.narrow(1, t, 1)?.squeeze(1)?;
            h = self.step(&x_t, &h)?;
            states.push(h.clone());
        }
        Ok(Tensor::stack(&states, 1)?)
    }

    fn vars(&self) -> [&Var; 9] {
        [
            &self.w_z, &self.u_z, &self.b_z, &self.w_r, &self.u_r, &self.b_r, &self.w_h,
            &self.u_h, &self.b_h,
        ]
    }

    const VAR_NAMES: [&'static str; 9] = [
        "w_z", "u_z", "b_z", "w_r", "u_r", "b_r", "w_h", "u_h", "b_h",
    ];
}

/// The correction network.
pub struct CorrectionNet {
    encoder: Vec<GruLayer>,
    decoder: Vec<GruLayer>,
    dense_w: Var,
    dense_b: Var,
    dropout: f32,
    alphabet: usize,
    max_cmd_len: usize,
}

impl CorrectionNet {
    /// Build the network for a given alphabet size and fixed width.
    pub fn new(
        config: &ModelConfig,
        alphabet: usize,
        max_cmd_len: usize,
        device: &Device,
    ) -> ModelResult<Self> {
        let mut salt = 0.5f32;
        let mut next_salt = || {
            salt += 1.0 / 7.0;
            salt
        };

        let mut encoder = Vec::with_capacity(config.input_layers);
        for layer in 0..config.input_layers {
            let input_dim = if layer == 0 { alphabet } else { config.hidden_units };
            encoder.push(GruLayer::new(
                input_dim,
                config.hidden_units,
                next_salt(),
                device,
            )?);
        }

        let mut decoder = Vec::with_capacity(config.output_layers);
        for _ in 0..config.output_layers {
            decoder.push(GruLayer::new(
                config.hidden_units,
                config.hidden_units,
                next_salt(),
                device,
            )?);
        }

        let dense_w = init_matrix(config.hidden_units, alphabet, next_salt(), device)?;
        let dense_b = init_bias(alphabet, device)?;

        Ok(Self {
            encoder,
            decoder,
            dense_w,
            dense_b,
            dropout: config.dropout,
            alphabet,
            max_cmd_len,
        })
    }

    /// Forward pass: `(batch, max_cmd_len, alphabet)` in and out.
    ///
    /// `train` enables dropout.
    pub fn forward(&self, x: &Tensor, train: bool) -> ModelResult<Tensor> {
        let mut seq = x.clone();
        for layer in &self.encoder {
            seq = layer.seq(&seq)?;
            seq = self.maybe_dropout(seq, train)?;
        }

        // Final state of the last encoder layer, tiled across the output
        // width (the repeat-vector bridge).
        let (_, len, _) = seq.dims3()?;
        let last = seq.narrow(1, len - 1, 1)?;
        let mut seq = last.repeat((1, self.max_cmd_len, 1))?;

        for layer in &self.decoder {
            seq = layer.seq(&seq)?;
            seq = self.maybe_dropout(seq, train)?;
        }

        let (batch, len, hidden) = seq.dims3()?;
        let flat = seq.reshape((batch * len, hidden))?;
        let out = flat
            .matmul(self.dense_w.as_tensor())?
            .broadcast_add(self.dense_b.as_tensor())?
            .relu()?;
        Ok(out.reshape((batch, len, self.alphabet))?)
    }

    /// Per-position predicted classes: `(batch, max_cmd_len)` of `u32`,
    /// ready for `FixedWidthCodec::decode_indices`.
    pub fn predict_classes(&self, x: &Tensor) -> ModelResult<Vec<Vec<u32>>> {
        let preds = self.forward(x, false)?;
        Ok(preds.argmax(D::Minus1)?.to_vec2::<u32>()?)
    }

    fn maybe_dropout(&self, seq: Tensor, train: bool) -> ModelResult<Tensor> {
        if train && self.dropout > 0.0 {
            Ok(ops::dropout(&seq, self.dropout)?)
        } else {
            Ok(seq)
        }
    }

    /// Alphabet size the net was built for.
    #[must_use]
    pub fn alphabet(&self) -> usize {
        self.alphabet
    }

    /// Fixed command width the net was built for.
    #[must_use]
    pub fn max_cmd_len(&self) -> usize {
        self.max_cmd_len
    }

    /// Trainable parameters for the optimizer.
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.named_vars().into_iter().map(|(_, v)| v.clone()).collect()
    }

    /// Every parameter with a stable checkpoint name.
    pub fn named_vars(&self) -> Vec<(String, &Var)> {
        let mut named = Vec::new();
        for (i, layer) in self.encoder.iter().enumerate() {
            for (name, var) in GruLayer::VAR_NAMES.iter().zip(layer.vars()) {
                named.push((format!("encoder.{i}.{name}"), var));
            }
        }
        for (i, layer) in self.decoder.iter().enumerate() {
            for (name, var) in GruLayer::VAR_NAMES.iter().zip(layer.vars()) {
                named.push((format!("decoder.{i}.{name}"), var));
            }
        }
        named.push(("dense.w".to_string(), &self.dense_w));
        named.push(("dense.b".to_string(), &self.dense_b));
        named
    }

    /// Total parameter count.
    pub fn num_params(&self) -> usize {
        self.named_vars()
            .iter()
            .map(|(_, v)| v.as_tensor().shape().elem_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig {
            input_layers: 2,
            output_layers: 2,
            hidden_units: 16,
            dropout: 0.0,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_forward_preserves_batch_shape() {
        let device = Device::Cpu;
        let net = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        let x = Tensor::zeros((4, 10, 12), DType::F32, &device).unwrap();
        let out = net.forward(&x, false).unwrap();
        assert_eq!(out.dims(), &[4, 10, 12]);
    }

    #[test]
    fn test_predict_classes_shape_and_range() {
        let device = Device::Cpu;
        let net = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        let x = Tensor::ones((2, 10, 12), DType::F32, &device).unwrap();
        let classes = net.predict_classes(&x).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].len(), 10);
        assert!(classes.iter().flatten().all(|&c| (c as usize) < 12));
    }

    #[test]
    fn test_construction_is_deterministic() {
        let device = Device::Cpu;
        let a = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        let b = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        let x = Tensor::ones((1, 10, 12), DType::F32, &device).unwrap();
        let out_a: Vec<f32> = a
            .forward(&x, false)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1()
            .unwrap();
        let out_b: Vec<f32> = b
            .forward(&x, false)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1()
            .unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_layer_counts_follow_config() {
        let device = Device::Cpu;
        let net = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        // 2 encoder + 2 decoder layers at 9 vars each, plus dense w/b.
        assert_eq!(net.named_vars().len(), 4 * 9 + 2);
        assert!(net.num_params() > 0);
    }

    #[test]
    fn test_relu_head_output_is_non_negative() {
        let device = Device::Cpu;
        let net = CorrectionNet::new(&config(), 12, 10, &device).unwrap();
        let x = Tensor::ones((1, 10, 12), DType::F32, &device).unwrap();
        let out: Vec<f32> = net
            .forward(&x, false)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1()
            .unwrap();
        assert!(out.iter().all(|&v| v >= 0.0));
    }
}
