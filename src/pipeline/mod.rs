pub mod controller;
pub mod response;

pub use controller::{ClassificationResult, ErrorResult, Pipeline, Stage};
pub use response::{PredictRequest, PredictResponse, PredictionValue};
