use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Shape every classifier input has: batch × height × width.
pub const INPUT_SHAPE: [usize; 3] = [1, 28, 28];

/// Element type of a tensor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    F64,
}

/// What an engine declares for its input: shape plus element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub shape: [usize; 3],
    pub dtype: DType,
}

impl TensorSpec {
    /// A (1, 28, 28) slot of the given element type.
    pub const fn digits(dtype: DType) -> Self {
        TensorSpec { shape: INPUT_SHAPE, dtype }
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A (1, 28, 28) array of values in [0.0, 1.0], in the element type the
/// target engine asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedTensor {
    F32(Array3<f32>),
    F64(Array3<f64>),
}

impl NormalizedTensor {
    pub fn dtype(&self) -> DType {
        match self {
            NormalizedTensor::F32(_) => DType::F32,
            NormalizedTensor::F64(_) => DType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            NormalizedTensor::F32(a) => a.shape(),
            NormalizedTensor::F64(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when shape and dtype both equal `spec`.
    pub fn matches(&self, spec: &TensorSpec) -> bool {
        self.dtype() == spec.dtype && self.shape() == spec.shape
    }

    /// Row-major values widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            NormalizedTensor::F32(a) => a.iter().map(|&v| v as f64).collect(),
            NormalizedTensor::F64(a) => a.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_len_is_784() {
        assert_eq!(TensorSpec::digits(DType::F32).len(), 784);
    }

    #[test]
    fn matches_checks_dtype_and_shape() {
        let t = NormalizedTensor::F32(Array3::zeros((1, 28, 28)));
        assert!(t.matches(&TensorSpec::digits(DType::F32)));
        assert!(!t.matches(&TensorSpec::digits(DType::F64)));

        let wrong = NormalizedTensor::F32(Array3::zeros((1, 14, 56)));
        assert_eq!(wrong.len(), 784);
        assert!(!wrong.matches(&TensorSpec::digits(DType::F32)));
    }
}
