//! Fixtures shared by unit tests.

use image::{GrayImage, Luma};
use ndarray::Array3;

use crate::activation::activation::ActivationFunction;
use crate::codec::EncodedImage;
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::network::{ModelMetadata, Network};
use crate::preprocess::{DType, NormalizedTensor, INPUT_SHAPE};

/// A 784 → 10 softmax classifier with hand-set weights: a blank input
/// predicts 0, and any meaningful amount of ink predicts 1.
pub(crate) fn ink_network() -> Network {
    let inputs: usize = INPUT_SHAPE.iter().product();
    let weights = Matrix::from_data(
        (0..inputs).map(|_| {
            let mut row = vec![0.0; 10];
            row[1] = 0.05;
            row
        }).collect(),
    );
    let mut bias_row = vec![0.0; 10];
    bias_row[0] = 1.0;
    let biases = Matrix::from_data(vec![bias_row]);

    let layer = Layer::from_parts(weights, biases, ActivationFunction::Softmax)
        .expect("ink layer shapes");
    Network::from_layers(vec![layer])
        .expect("ink network chains")
        .with_metadata(ModelMetadata::digits("ink detector"))
}

/// A network with fixed, position-derived weights in [-0.5, 0.5] scaled by
/// fan-in, built from (size, input_size, activation) tuples. Not validated,
/// so tests can build broken chains.
pub(crate) fn patterned_network(specs: &[(usize, usize, ActivationFunction)]) -> Network {
    let layers = specs.iter().map(|(size, inputs, activation)| {
        let scale = 1.0 / ((*inputs).max(1) as f64).sqrt();
        let weights = Matrix::from_fn(*inputs, *size, |r, c| {
            (((r * 31 + c * 17) % 13) as f64 / 12.0 - 0.5) * scale
        });
        let biases = Matrix::from_fn(1, *size, |_, c| (c % 3) as f64 * 0.01);
        Layer::from_parts(weights, biases, activation.clone()).expect("patterned layer shapes")
    }).collect();
    Network { layers, metadata: None }
}

/// A (1, 28, 28) tensor filled with `value`.
pub(crate) fn uniform_tensor(dtype: DType, value: f64) -> NormalizedTensor {
    let shape = (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2]);
    match dtype {
        DType::F32 => NormalizedTensor::F32(Array3::from_elem(shape, value as f32)),
        DType::F64 => NormalizedTensor::F64(Array3::from_elem(shape, value)),
    }
}

/// A black `size`×`size` canvas with a white square stroke in the middle
/// when `inked` is set.
pub(crate) fn canvas(size: u32, inked: bool) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let lo = size / 3;
        let hi = 2 * size / 3;
        if inked && (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

pub(crate) fn canvas_uri(size: u32, inked: bool) -> EncodedImage {
    EncodedImage::from_gray_image(&canvas(size, inked)).expect("png encoding")
}
