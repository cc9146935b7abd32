use serde::{Deserialize, Serialize};

use crate::codec::EncodedImage;
use crate::error::ErrorKind;
use crate::pipeline::controller::ClassificationResult;

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub image: EncodedImage,
}

/// Either a digit or a string describing why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Digit(u8),
    Label(String),
}

/// Wire form of a classification.
///
/// A disabled engine answers with the bare label `"Error"`; any other
/// failure carries its message. Confidence is 0 whenever there is no digit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: PredictionValue,
    pub confidence: f64,
}

impl PredictResponse {
    pub fn error(message: impl Into<String>) -> Self {
        PredictResponse { prediction: PredictionValue::Label(message.into()), confidence: 0.0 }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.prediction, PredictionValue::Label(_))
    }
}

impl From<&ClassificationResult> for PredictResponse {
    fn from(result: &ClassificationResult) -> Self {
        match result {
            ClassificationResult::Prediction(p) => PredictResponse {
                prediction: PredictionValue::Digit(p.digit),
                confidence: p.confidence,
            },
            ClassificationResult::Error(e) if e.kind == ErrorKind::EngineDisabled => {
                PredictResponse::error("Error")
            }
            ClassificationResult::Error(e) => PredictResponse::error(e.message.clone()),
        }
    }
}
