use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Flat f64 values.
    Numeric,
    /// Grayscale image resized to width×height, normalized to [0, 1].
    ImageGrayscale { width: u32, height: u32 },
    /// RGB image resized to width×height, normalized to [0, 1], flattened as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so models without metadata deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Human-readable class labels for the output layer (e.g. ["0","1",...,"9"]).
    pub output_labels: Option<Vec<String>>,
}

impl ModelMetadata {
    /// Metadata for a 28×28 grayscale digit classifier.
    pub fn digits(description: impl Into<String>) -> Self {
        ModelMetadata {
            description: Some(description.into()),
            input_type: Some(InputType::ImageGrayscale { width: 28, height: 28 }),
            output_labels: Some((0..10).map(|d| d.to_string()).collect()),
        }
    }
}
