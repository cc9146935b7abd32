use parking_lot::Mutex;

use crate::decode::{ProbabilityVector, DIGIT_CLASSES};
use crate::engine::lite::format::LiteModel;
use crate::engine::lite::interpreter::LiteInterpreter;
use crate::engine::InferenceEngine;
use crate::error::{ModelError, PipelineError};
use crate::preprocess::{NormalizedTensor, TensorSpec, INPUT_SHAPE};

/// Engine variant backed by a [`LiteInterpreter`].
///
/// The interpreter is not reentrant, so the mutex is held across
/// copy-in, invoke and read-out. `parking_lot::Mutex` does not poison, so a
/// panic inside one request leaves the engine usable for the next.
#[derive(Debug)]
pub struct LiteInterpreterExecutor {
    spec: TensorSpec,
    interpreter: Mutex<LiteInterpreter>,
}

impl LiteInterpreterExecutor {
    pub fn new(model: LiteModel) -> Result<Self, ModelError> {
        if model.input.shape != INPUT_SHAPE || model.outputs != DIGIT_CLASSES {
            return Err(ModelError::Shape(format!(
                "lite model maps {:?} to {} outputs, expected {:?} to {}",
                model.input.shape, model.outputs, INPUT_SHAPE, DIGIT_CLASSES
            )));
        }
        Ok(LiteInterpreterExecutor {
            spec: model.input,
            interpreter: Mutex::new(LiteInterpreter::new(model)),
        })
    }

    /// Number of completed invocations since load.
    pub fn invocations(&self) -> u64 {
        self.interpreter.lock().invocations()
    }
}

impl InferenceEngine for LiteInterpreterExecutor {
    fn name(&self) -> &'static str {
        "lite"
    }

    fn input_spec(&self) -> TensorSpec {
        self.spec
    }

    fn is_reentrant(&self) -> bool {
        false
    }

    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, PipelineError> {
        let mut interpreter = self.interpreter.lock();
        interpreter.set_input(tensor)?;
        interpreter.invoke();
        Ok(ProbabilityVector::from_f32(interpreter.output()))
    }
}
