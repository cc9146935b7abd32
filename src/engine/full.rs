use std::path::Path;

use crate::decode::{ProbabilityVector, DIGIT_CLASSES};
use crate::engine::InferenceEngine;
use crate::error::{ModelError, PipelineError};
use crate::network::Network;
use crate::preprocess::{DType, NormalizedTensor, TensorSpec, INPUT_SHAPE};

/// Engine variant that runs the dense [`Network`] from a full JSON model.
///
/// `Network::predict` takes `&self` and allocates its intermediates per
/// call, so this executor needs no lock.
#[derive(Debug)]
pub struct FullModelExecutor {
    network: Network,
}

impl FullModelExecutor {
    /// Accepts a network only if it maps 784 inputs to 10 outputs.
    pub fn from_network(network: Network) -> Result<Self, ModelError> {
        network.validate()?;
        let expected_inputs: usize = INPUT_SHAPE.iter().product();
        if network.input_size() != expected_inputs || network.output_size() != DIGIT_CLASSES {
            return Err(ModelError::Shape(format!(
                "model maps {} inputs to {} outputs, expected {} to {}",
                network.input_size(), network.output_size(), expected_inputs, DIGIT_CLASSES
            )));
        }
        Ok(FullModelExecutor { network })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        FullModelExecutor::from_network(Network::load_json(path)?)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

impl InferenceEngine for FullModelExecutor {
    fn name(&self) -> &'static str {
        "full"
    }

    fn input_spec(&self) -> TensorSpec {
        TensorSpec::digits(DType::F64)
    }

    fn is_reentrant(&self) -> bool {
        true
    }

    /// Accepts `f64` tensors, and `f32` tensors by widening; the shape must
    /// be exactly (1, 28, 28).
    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, PipelineError> {
        if tensor.shape() != INPUT_SHAPE {
            return Err(PipelineError::ShapeOrType(format!(
                "full model expects {:?}, got {:?}", INPUT_SHAPE, tensor.shape()
            )));
        }
        Ok(ProbabilityVector::new(self.network.predict(&tensor.to_f64_vec())))
    }
}
