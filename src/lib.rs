pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod error;
pub mod config;
pub mod logging;
pub mod codec;
pub mod preprocess;
pub mod engine;
pub mod decode;
pub mod pipeline;

#[cfg(test)]
mod test_support;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use codec::EncodedImage;
pub use config::Config;
pub use decode::Prediction;
pub use engine::{Engine, InferenceEngine};
pub use error::{ErrorKind, PipelineError};
pub use pipeline::{ClassificationResult, Pipeline, PredictRequest, PredictResponse};
