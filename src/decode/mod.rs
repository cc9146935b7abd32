pub mod result_decoder;

pub use result_decoder::{decode, Prediction, ProbabilityVector, DIGIT_CLASSES};
