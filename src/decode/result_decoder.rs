use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Number of digit classes the classifier distinguishes.
pub const DIGIT_CLASSES: usize = 10;

/// Per-class output of an engine, index = digit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    pub fn new(values: Vec<f64>) -> Self {
        ProbabilityVector(values)
    }

    pub fn from_f32(values: &[f32]) -> Self {
        ProbabilityVector(values.iter().map(|&v| v as f64).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for ProbabilityVector {
    fn from(values: Vec<f64>) -> Self {
        ProbabilityVector(values)
    }
}

/// A successful classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 0..=9
    pub digit: u8,
    /// Winning probability as a percentage.
    pub confidence: f64,
}

/// Reduces a probability vector to the most likely digit.
///
/// Ties go to the lowest index. NaN entries never win; a vector that is all
/// NaN is treated as malformed.
pub fn decode(vector: &ProbabilityVector) -> Result<Prediction, PipelineError> {
    if vector.len() != DIGIT_CLASSES {
        return Err(PipelineError::MalformedVector(format!(
            "expected {} elements, got {}", DIGIT_CLASSES, vector.len()
        )));
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in vector.as_slice().iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        // Strict `>` keeps the first occurrence of the maximum.
        if best.map_or(true, |(_, b)| p > b) {
            best = Some((i, p));
        }
    }

    let (digit, p) = best.ok_or_else(|| {
        PipelineError::MalformedVector("every element is NaN".into())
    })?;

    Ok(Prediction { digit: digit as u8, confidence: p * 100.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: [f64; 10]) -> ProbabilityVector {
        ProbabilityVector::new(values.to_vec())
    }

    #[test]
    fn picks_the_maximum() {
        let p = decode(&vector([0.01, 0.02, 0.03, 0.7, 0.04, 0.05, 0.05, 0.05, 0.03, 0.02])).unwrap();
        assert_eq!(p.digit, 3);
        assert!((p.confidence - 70.0).abs() < 1e-9);
    }

    #[test]
    fn ties_go_to_lower_index() {
        let p = decode(&vector([0.0, 0.0, 0.4, 0.0, 0.0, 0.0, 0.0, 0.4, 0.2, 0.0])).unwrap();
        assert_eq!(p.digit, 2);

        let uniform = decode(&vector([0.1; 10])).unwrap();
        assert_eq!(uniform.digit, 0);
        assert!((uniform.confidence - 10.0).abs() < 1e-9);
    }

    #[test]
    fn result_stays_in_range_for_any_distribution() {
        for hot in 0..10 {
            let mut values = [0.0; 10];
            values[hot] = 1.0;
            let p = decode(&vector(values)).unwrap();
            assert_eq!(p.digit as usize, hot);
            assert!((0.0..=100.0).contains(&p.confidence));
        }
    }

    #[test]
    fn nan_never_wins() {
        let p = decode(&vector([f64::NAN, 0.2, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1])).unwrap();
        assert_eq!(p.digit, 1);
        assert!(decode(&vector([f64::NAN; 10])).is_err());
    }

    #[test]
    fn wrong_length_is_malformed() {
        for len in [0, 9, 11] {
            let err = decode(&ProbabilityVector::new(vec![0.1; len])).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedVector(_)));
        }
    }
}
