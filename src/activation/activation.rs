use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Vector-valued: normalizes the whole layer output into a probability
    /// distribution. Only `apply` knows how to evaluate it.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Applies the activation to a full pre-activation vector `z = xW + b`.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.element(x)).collect(),
        }
    }

    /// In-place `f32` variant used by the lite interpreter.
    ///
    /// Element-wise activations are evaluated in `f64` and narrowed back, so
    /// the only precision loss relative to `apply` comes from the `f32`
    /// weights and accumulation.
    pub fn apply_in_place_f32(&self, z: &mut [f32]) {
        match self {
            ActivationFunction::Softmax => {
                let max = z.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut sum = 0.0f32;
                for v in z.iter_mut() {
                    *v = (*v - max).exp();
                    sum += *v;
                }
                if sum > 0.0 {
                    z.iter_mut().for_each(|v| *v /= sum);
                }
            }
            _ => z.iter_mut().for_each(|v| *v = self.element(*v as f64) as f32),
        }
    }

    fn element(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            // vector-valued; `apply` never routes it here
            ActivationFunction::Softmax => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }
}

/// Max-shifted softmax so large logits do not overflow `exp`.
fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}
