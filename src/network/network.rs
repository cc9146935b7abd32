use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::layers::dense::Layer;
use crate::error::ModelError;
use crate::network::metadata::ModelMetadata;

/// A stack of dense layers plus optional annotations. Serialized as the
/// full JSON model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network, ModelError> {
        let network = Network { layers, metadata: None };
        network.validate()?;
        Ok(network)
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = Some(metadata);
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Checks every layer's own shape and that consecutive layers chain.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::Shape("model has no layers".into()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.check().map_err(|e| ModelError::Shape(format!("layer {}: {}", i, e)))?;
            if i > 0 && layer.input_size() != self.layers[i - 1].size {
                return Err(ModelError::Shape(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i, layer.input_size(), i - 1, self.layers[i - 1].size
                )));
            }
        }
        Ok(())
    }

    /// Forward pass. Takes `&self` and keeps every intermediate local, so
    /// concurrent callers never observe each other.
    ///
    /// Panics if `input.len() != self.input_size()`; callers check the
    /// tensor shape first.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| ModelError::io(path, source))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ModelError::io(path, source))?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
