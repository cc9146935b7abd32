//! Compiled "lite" model artifact.
//!
//! A flat little-endian binary holding `f32` weights for a dense network and
//! the fixed input/output slot sizes the interpreter binds at load time:
//!
//! ```text
//! magic      4  b"FNLT"
//! version    u16
//! dtype      u8       0 = f32 (the only slot type)
//! rank       u8       always 3
//! shape      u32 × 3
//! outputs    u32
//! layers     u32
//! per layer:
//!   inputs   u32
//!   size     u32
//!   act      u8 tag + f32 parameter
//!   weights  f32 × inputs × size   (row-major, one row per input)
//!   biases   f32 × size
//! ```

use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::error::ModelError;
use crate::network::{InputType, Network};
use crate::preprocess::{DType, TensorSpec};

pub const LITE_MAGIC: &[u8; 4] = b"FNLT";
pub const LITE_VERSION: u16 = 1;

/// One dense layer in `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteLayer {
    pub inputs: usize,
    pub size: usize,
    pub activation: ActivationFunction,
    /// Row-major `inputs × size`.
    pub weights: Vec<f32>,
    pub biases: Vec<f32>,
}

impl LiteLayer {
    /// `out = activation(input · W + b)`, written into `out`.
    pub fn run(&self, input: &[f32], out: &mut Vec<f32>) {
        out.clear();
        out.extend_from_slice(&self.biases);
        for (i, &x) in input.iter().enumerate().take(self.inputs) {
            if x == 0.0 {
                continue;
            }
            let row = &self.weights[i * self.size..(i + 1) * self.size];
            for (o, &w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        self.activation.apply_in_place_f32(out);
    }
}

/// Parsed lite artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteModel {
    pub input: TensorSpec,
    pub outputs: usize,
    pub layers: Vec<LiteLayer>,
}

impl LiteModel {
    /// Compiles a full network into its lite form.
    ///
    /// The input slot shape comes from the network's image metadata when
    /// present, otherwise 784 inputs are bound as (1, 28, 28).
    pub fn compile(network: &Network) -> Result<LiteModel, ModelError> {
        network.validate()?;

        let shape = match network.metadata.as_ref().and_then(|m| m.input_type.as_ref()) {
            Some(InputType::ImageGrayscale { width, height }) => [1, *height as usize, *width as usize],
            _ if network.input_size() == 784 => [1, 28, 28],
            _ => [1, 1, network.input_size()],
        };
        let input = TensorSpec { shape, dtype: DType::F32 };
        if input.len() != network.input_size() {
            return Err(ModelError::Shape(format!(
                "metadata input {:?} does not match {} model inputs",
                shape, network.input_size()
            )));
        }

        let layers = network.layers.iter().map(|layer| LiteLayer {
            inputs: layer.input_size(),
            size: layer.size,
            activation: layer.activator.clone(),
            weights: layer.weights.to_f32_vec(),
            biases: layer.biases.to_f32_vec(),
        }).collect();

        let model = LiteModel { input, outputs: network.output_size(), layers };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let mut width = self.input.len();
        if self.layers.is_empty() {
            return Err(ModelError::LiteFormat("no layers".into()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs != width {
                return Err(ModelError::LiteFormat(format!(
                    "layer {} expects {} inputs, previous stage produces {}", i, layer.inputs, width
                )));
            }
            if layer.weights.len() != layer.inputs * layer.size || layer.biases.len() != layer.size {
                return Err(ModelError::LiteFormat(format!("layer {} parameter count mismatch", i)));
            }
            width = layer.size;
        }
        if width != self.outputs {
            return Err(ModelError::LiteFormat(format!(
                "declares {} outputs but last layer produces {}", self.outputs, width
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let params: usize = self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum();
        let mut buf = Vec::with_capacity(32 + self.layers.len() * 13 + params * 4);

        buf.extend_from_slice(LITE_MAGIC);
        buf.extend_from_slice(&LITE_VERSION.to_le_bytes());
        buf.push(0); // f32
        buf.push(3);
        for &dim in &self.input.shape {
            buf.extend_from_slice(&(dim as u32).to_le_bytes());
        }
        buf.extend_from_slice(&(self.outputs as u32).to_le_bytes());
        buf.extend_from_slice(&(self.layers.len() as u32).to_le_bytes());

        for layer in &self.layers {
            buf.extend_from_slice(&(layer.inputs as u32).to_le_bytes());
            buf.extend_from_slice(&(layer.size as u32).to_le_bytes());
            let (tag, param) = activation_tag(&layer.activation);
            buf.push(tag);
            buf.extend_from_slice(&param.to_le_bytes());
            for v in layer.weights.iter().chain(&layer.biases) {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<LiteModel, ModelError> {
        let mut r = Reader { bytes, pos: 0 };

        if r.take(4)? != LITE_MAGIC {
            return Err(ModelError::LiteFormat("bad magic".into()));
        }
        let version = r.u16()?;
        if version != LITE_VERSION {
            return Err(ModelError::LiteFormat(format!("unsupported version {}", version)));
        }
        if r.u8()? != 0 {
            return Err(ModelError::LiteFormat("input slot must be f32".into()));
        }
        if r.u8()? != 3 {
            return Err(ModelError::LiteFormat("input slot must be rank 3".into()));
        }
        let shape = [r.u32()? as usize, r.u32()? as usize, r.u32()? as usize];
        shape.iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| ModelError::LiteFormat(format!("input shape {:?} overflows", shape)))?;
        let outputs = r.u32()? as usize;
        let layer_count = r.u32()? as usize;

        let mut layers = Vec::with_capacity(layer_count.min(64));
        for _ in 0..layer_count {
            let inputs = r.u32()? as usize;
            let size = r.u32()? as usize;
            let tag = r.u8()?;
            let param = r.f32()?;
            let activation = activation_from_tag(tag, param)
                .ok_or_else(|| ModelError::LiteFormat(format!("unknown activation tag {}", tag)))?;
            let count = inputs.checked_mul(size)
                .ok_or_else(|| ModelError::LiteFormat("layer size overflow".into()))?;
            let weights = r.f32_vec(count)?;
            let biases = r.f32_vec(size)?;
            layers.push(LiteLayer { inputs, size, activation, weights, biases });
        }
        if r.pos != bytes.len() {
            return Err(ModelError::LiteFormat(format!("{} trailing bytes", bytes.len() - r.pos)));
        }

        let model = LiteModel { input: TensorSpec { shape, dtype: DType::F32 }, outputs, layers };
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()).map_err(|source| ModelError::io(path, source))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<LiteModel, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ModelError::io(path, source))?;
        LiteModel::from_bytes(&bytes)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Activation tags
// ---------------------------------------------------------------------------

fn activation_tag(activation: &ActivationFunction) -> (u8, f32) {
    match activation {
        ActivationFunction::Identity => (0, 0.0),
        ActivationFunction::Sigmoid => (1, 0.0),
        ActivationFunction::ReLU => (2, 0.0),
        ActivationFunction::Softmax => (3, 0.0),
        ActivationFunction::Tanh => (4, 0.0),
        ActivationFunction::LeakyReLU { alpha } => (5, *alpha as f32),
        ActivationFunction::Elu { alpha } => (6, *alpha as f32),
        ActivationFunction::Gelu => (7, 0.0),
        ActivationFunction::Swish => (8, 0.0),
    }
}

fn activation_from_tag(tag: u8, param: f32) -> Option<ActivationFunction> {
    Some(match tag {
        0 => ActivationFunction::Identity,
        1 => ActivationFunction::Sigmoid,
        2 => ActivationFunction::ReLU,
        3 => ActivationFunction::Softmax,
        4 => ActivationFunction::Tanh,
        5 => ActivationFunction::LeakyReLU { alpha: param as f64 },
        6 => ActivationFunction::Elu { alpha: param as f64 },
        7 => ActivationFunction::Gelu,
        8 => ActivationFunction::Swish,
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Byte reader
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ModelError> {
        let end = self.pos.checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| ModelError::LiteFormat(format!("truncated at byte {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ModelError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ModelError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, ModelError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, ModelError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32, ModelError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    fn f32_vec(&mut self, count: usize) -> Result<Vec<f32>, ModelError> {
        let len = count.checked_mul(4)
            .ok_or_else(|| ModelError::LiteFormat("tensor size overflow".into()))?;
        Ok(self.take(len)?
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}
