use crate::engine::lite::format::LiteModel;
use crate::error::PipelineError;
use crate::preprocess::{NormalizedTensor, TensorSpec};

/// Runs a [`LiteModel`] through buffers allocated once at construction.
///
/// The input slot, the output slot and the two scratch buffers are owned by
/// the interpreter and reused by every invocation. A call is therefore three
/// steps on shared state (`set_input`, `invoke`, `output`), and two callers
/// interleaving those steps on one interpreter read each other's results.
/// [`LiteInterpreterExecutor`](super::LiteInterpreterExecutor) holds a lock
/// across all three.
#[derive(Debug)]
pub struct LiteInterpreter {
    model: LiteModel,
    input: Vec<f32>,
    output: Vec<f32>,
    ping: Vec<f32>,
    pong: Vec<f32>,
    invocations: u64,
}

impl LiteInterpreter {
    pub fn new(model: LiteModel) -> Self {
        let widest = model.layers.iter().map(|l| l.size).max().unwrap_or(0).max(model.input.len());
        LiteInterpreter {
            input: vec![0.0; model.input.len()],
            output: vec![0.0; model.outputs],
            ping: Vec::with_capacity(widest),
            pong: Vec::with_capacity(widest),
            invocations: 0,
            model,
        }
    }

    pub fn input_spec(&self) -> TensorSpec {
        self.model.input
    }

    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Copies `tensor` into the bound input slot. The tensor must be `f32`
    /// with exactly the slot's shape.
    pub fn set_input(&mut self, tensor: &NormalizedTensor) -> Result<(), PipelineError> {
        let spec = self.model.input;
        match tensor {
            NormalizedTensor::F32(values) if tensor.shape() == spec.shape => {
                for (slot, &v) in self.input.iter_mut().zip(values.iter()) {
                    *slot = v;
                }
                Ok(())
            }
            _ => Err(PipelineError::ShapeOrType(format!(
                "lite input slot is {:?} {:?}, got {:?} {:?}",
                spec.dtype, spec.shape, tensor.dtype(), tensor.shape()
            ))),
        }
    }

    /// Runs every layer over the current input slot and fills the output slot.
    pub fn invoke(&mut self) {
        let mut src = std::mem::take(&mut self.ping);
        let mut dst = std::mem::take(&mut self.pong);
        src.clear();
        src.extend_from_slice(&self.input);

        for layer in &self.model.layers {
            layer.run(&src, &mut dst);
            std::mem::swap(&mut src, &mut dst);
        }

        self.output.copy_from_slice(&src);
        self.ping = src;
        self.pong = dst;
        self.invocations += 1;
    }

    /// The bound output slot, as left by the last `invoke`.
    pub fn output(&self) -> &[f32] {
        &self.output
    }
}
