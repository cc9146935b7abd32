use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use crate::error::ModelError;

/// Fully connected layer: `a = activation(xW + b)`.
///
/// `weights` is `input_size × size`, `biases` is `1 × size`. Inference never
/// mutates a layer, so a loaded network can be shared across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    /// Builds a layer from explicit parameters, checking their shapes.
    pub fn from_parts(
        weights: Matrix,
        biases: Matrix,
        activation: ActivationFunction,
    ) -> Result<Layer, ModelError> {
        let layer = Layer { size: weights.cols, weights, biases, activator: activation };
        layer.check()?;
        Ok(layer)
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Verifies that weights and biases agree with `size`.
    pub fn check(&self) -> Result<(), ModelError> {
        if !self.weights.is_rectangular() || self.weights.cols != self.size {
            return Err(ModelError::Shape(format!(
                "weights are not {}x{}", self.weights.rows, self.size
            )));
        }
        if !self.biases.is_rectangular() || self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(ModelError::Shape(format!("biases are not 1x{}", self.size)));
        }
        Ok(())
    }

    /// Read-only forward pass for a single sample.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let x = Matrix::from_data(vec![input.to_vec()]);
        let z = &(&x * &self.weights) + &self.biases;
        self.activator.apply(&z.data[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_weights_bias_and_activation() {
        let layer = Layer::from_parts(
            Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.0]]),
            Matrix::from_data(vec![vec![0.5, 0.0]]),
            ActivationFunction::ReLU,
        ).unwrap();
        assert_eq!(layer.forward(&[1.0, 1.0]), vec![3.5, 0.0]);
    }

    #[test]
    fn from_parts_rejects_bias_mismatch() {
        let err = Layer::from_parts(
            Matrix::zeros(3, 2),
            Matrix::zeros(1, 3),
            ActivationFunction::Identity,
        ).unwrap_err();
        assert!(matches!(err, ModelError::Shape(_)));
    }

    #[test]
    fn size_comes_from_weight_columns() {
        let layer = Layer::from_parts(
            Matrix::zeros(784, 10),
            Matrix::zeros(1, 10),
            ActivationFunction::Softmax,
        ).unwrap();
        assert_eq!((layer.input_size(), layer.size), (784, 10));
    }

    #[test]
    fn legacy_fields_are_ignored_on_load() {
        // Older model files also stored per-layer activations for backprop.
        let json = r#"{
            "size": 1,
            "neurons": {"rows":1,"cols":1,"data":[[0.3]]},
            "pre_neurons": {"rows":1,"cols":1,"data":[[0.1]]},
            "weights": {"rows":1,"cols":1,"data":[[2.0]]},
            "biases": {"rows":1,"cols":1,"data":[[0.0]]},
            "activator": "Identity"
        }"#;
        let layer: Layer = serde_json::from_str(json).unwrap();
        assert_eq!(layer.forward(&[1.5]), vec![3.0]);
    }
}
