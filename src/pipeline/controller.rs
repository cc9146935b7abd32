use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::{self, EncodedImage};
use crate::config::Config;
use crate::decode::{self, Prediction};
use crate::engine::{self, InferenceEngine};
use crate::error::{ErrorKind, PipelineError};
use crate::preprocess::Preprocessor;

/// Where a request is in the pipeline. A failure is reported with the
/// stage that was running when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Decoded,
    Normalized,
    Inferred,
    DecodedResult,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::Normalized => "normalized",
            Stage::Inferred => "inferred",
            Stage::DecodedResult => "decoded_result",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    /// Last stage entered before the failure.
    pub stage: Stage,
    pub message: String,
}

/// Outcome of one classification. Never a Rust error: every failure is
/// folded into [`ClassificationResult::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationResult {
    Prediction(Prediction),
    Error(ErrorResult),
}

impl ClassificationResult {
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            ClassificationResult::Prediction(p) => Some(p),
            ClassificationResult::Error(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ClassificationResult::Prediction(_) => None,
            ClassificationResult::Error(e) => Some(e.kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs decode → normalize → infer → decode-result for one image.
///
/// Holds no per-request state, so one `Pipeline` can serve every request
/// thread at once. Whether concurrent calls into the engine are serialized
/// is the engine's business.
#[derive(Clone)]
pub struct Pipeline {
    engine: Arc<dyn InferenceEngine>,
    preprocessor: Preprocessor,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine.name())
            .field("preprocessor", &self.preprocessor)
            .finish()
    }
}

impl Pipeline {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Pipeline { engine, preprocessor: Preprocessor::default() }
    }

    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// A pipeline over the process-wide engine, loading it on first use.
    pub fn global(config: &Config) -> Self {
        let engine: Arc<dyn InferenceEngine> = engine::init_global(config);
        Pipeline::new(engine).with_preprocessor(Preprocessor::new(config.resize_filter))
    }

    pub fn engine(&self) -> &dyn InferenceEngine {
        self.engine.as_ref()
    }

    /// Classifies one data-URI image.
    ///
    /// The same input always yields the same result. A disabled engine
    /// short-circuits at `Received`, before the input is even looked at. A
    /// panic inside any stage is contained and reported as `Internal`.
    pub fn classify(&self, encoded: &EncodedImage) -> ClassificationResult {
        let stage = Cell::new(Stage::Received);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(encoded, &stage)));

        match outcome {
            Ok(Ok(prediction)) => {
                debug!(
                    engine = self.engine.name(),
                    digit = prediction.digit,
                    confidence = prediction.confidence,
                    "classified"
                );
                ClassificationResult::Prediction(prediction)
            }
            Ok(Err(err)) => {
                warn!(stage = %stage.get(), error = %err, "classification failed");
                ClassificationResult::Error(ErrorResult {
                    kind: err.kind(),
                    stage: stage.get(),
                    message: err.to_string(),
                })
            }
            Err(payload) => {
                let message = format!("stage panicked: {}", panic_message(payload.as_ref()));
                warn!(stage = %stage.get(), error = %message, "classification failed");
                ClassificationResult::Error(ErrorResult {
                    kind: ErrorKind::Internal,
                    stage: stage.get(),
                    message,
                })
            }
        }
    }

    fn run(&self, encoded: &EncodedImage, stage: &Cell<Stage>) -> Result<Prediction, PipelineError> {
        self.engine.ensure_enabled()?;

        let grid = codec::decode(encoded)?;
        stage.set(Stage::Decoded);

        let tensor = self.preprocessor.normalize(&grid, &self.engine.input_spec())?;
        stage.set(Stage::Normalized);

        let probabilities = self.engine.predict(&tensor)?;
        stage.set(Stage::Inferred);

        let prediction = decode::decode(&probabilities)?;
        stage.set(Stage::DecodedResult);

        stage.set(Stage::Done);
        Ok(prediction)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
