//! Small feed-forward networks loaded from safetensors
//!
//! Trained re-rankers and category classifiers are exported as a stack of dense layers
//! named `layers.{i}.weight` / `layers.{i}.bias`, with ReLU between layers and no
//! activation after the last one.

use crate::error::{MatcherError, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::Linear;
use log::{info, warn};
use std::path::Path;

/// Pick a compute device; `CV_MATCHER_DEVICE=cpu|cuda|metal` overrides detection
pub fn select_device() -> Device {
    let preference = std::env::var("CV_MATCHER_DEVICE")
        .map(|v| v.to_lowercase())
        .unwrap_or_default();

    if preference == "cpu" {
        return Device::Cpu;
    }

    #[cfg(feature = "cuda")]
    {
        if preference.is_empty() || preference == "cuda" {
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("Using CUDA device for trained models");
                    return device;
                }
                Err(e) => warn!("CUDA initialization failed: {}", e),
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        if preference.is_empty() || preference == "metal" {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Using Metal device for trained models");
                    return device;
                }
                Err(e) => warn!("Metal initialization failed: {}", e),
            }
        }
    }

    if !preference.is_empty() {
        warn!("Device '{}' not available, using CPU", preference);
    }
    info!("Using CPU for trained models");
    Device::Cpu
}

pub struct FeedForward {
    layers: Vec<Linear>,
    input_dim: usize,
    output_dim: usize,
    device: Device,
}

impl FeedForward {
    pub fn load(path: &Path, device: &Device) -> Result<Self> {
        let mut tensors = candle_core::safetensors::load(path, device).map_err(|e| {
            MatcherError::DependencyUnavailable(format!(
                "Failed to load weights from {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut layers = Vec::new();
        while let Some(weight) = tensors.remove(&format!("layers.{}.weight", layers.len())) {
            let bias = tensors.remove(&format!("layers.{}.bias", layers.len()));
            layers.push((weight, bias));
        }

        if !tensors.is_empty() {
            warn!(
                "Ignoring {} unexpected tensors in {}",
                tensors.len(),
                path.display()
            );
        }

        Self::from_layers(layers, device).map_err(|e| {
            MatcherError::DependencyUnavailable(format!(
                "Invalid network in {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Build from `(weight[out, in], bias[out])` pairs
    pub fn from_layers(layers: Vec<(Tensor, Option<Tensor>)>, device: &Device) -> Result<Self> {
        if layers.is_empty() {
            return Err(MatcherError::Inference("network has no layers".to_string()));
        }

        let mut built = Vec::with_capacity(layers.len());
        let mut dims: Vec<(usize, usize)> = Vec::with_capacity(layers.len());
        for (i, (weight, bias)) in layers.into_iter().enumerate() {
            let (out_dim, in_dim) = weight.dims2()?;
            if let Some((prev_out, _)) = dims.last() {
                if *prev_out != in_dim {
                    return Err(MatcherError::Inference(format!(
                        "layer {} expects {} inputs but previous layer yields {}",
                        i, in_dim, prev_out
                    )));
                }
            }
            let bias = match bias {
                Some(b) => {
                    if b.dims1()? != out_dim {
                        return Err(MatcherError::Inference(format!(
                            "layer {} bias does not match {} outputs",
                            i, out_dim
                        )));
                    }
                    Some(b.to_dtype(DType::F32)?)
                }
                None => None,
            };
            dims.push((out_dim, in_dim));
            built.push(Linear::new(weight.to_dtype(DType::F32)?, bias));
        }

        let input_dim = dims[0].1;
        let output_dim = dims[dims.len() - 1].0;

        Ok(Self {
            layers: built,
            input_dim,
            output_dim,
            device: device.clone(),
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Forward a batch of feature rows, returning raw outputs per row
    pub fn forward_rows(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != self.input_dim) {
            return Err(MatcherError::Inference(format!(
                "network expects {} features, got {}",
                self.input_dim,
                bad.len()
            )));
        }

        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let mut x = Tensor::from_vec(flat, (rows.len(), self.input_dim), &self.device)?;

        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            if i < last {
                x = x.relu()?;
            }
        }

        Ok(x.to_vec2::<f32>()?)
    }
}
