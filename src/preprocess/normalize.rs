use image::imageops::{self, FilterType};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::codec::PixelGrid;
use crate::error::PipelineError;
use crate::preprocess::tensor::{DType, NormalizedTensor, TensorSpec, INPUT_SHAPE};

/// Resampling filter used when shrinking the drawing to 28×28.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest    => FilterType::Nearest,
            ResizeFilter::Triangle   => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian   => FilterType::Gaussian,
            ResizeFilter::Lanczos3   => FilterType::Lanczos3,
        }
    }
}

/// Turns a pixel grid of any size into a model-ready tensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor {
    filter: ResizeFilter,
}

impl Preprocessor {
    pub fn new(filter: ResizeFilter) -> Self {
        Preprocessor { filter }
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    /// Resizes to exactly 28×28, scales every sample by 1/255, and adds the
    /// batch axis, producing `spec.dtype` elements.
    ///
    /// A spec whose shape is not (1, 28, 28) is a wiring bug between engine
    /// and preprocessor and is reported as `ShapeOrType` before any engine
    /// sees the tensor.
    pub fn normalize(&self, grid: &PixelGrid, spec: &TensorSpec) -> Result<NormalizedTensor, PipelineError> {
        if spec.shape != INPUT_SHAPE {
            return Err(PipelineError::ShapeOrType(format!(
                "engine declares input shape {:?}, preprocessor produces {:?}",
                spec.shape, INPUT_SHAPE
            )));
        }

        let [_, height, width] = INPUT_SHAPE;
        let resized = imageops::resize(grid.as_image(), width as u32, height as u32, self.filter.into());
        let sample = |y: usize, x: usize| resized.get_pixel(x as u32, y as u32).0[0];

        let tensor = match spec.dtype {
            DType::F32 => NormalizedTensor::F32(Array3::from_shape_fn(
                (1, height, width),
                |(_, y, x)| sample(y, x) as f32 / 255.0,
            )),
            DType::F64 => NormalizedTensor::F64(Array3::from_shape_fn(
                (1, height, width),
                |(_, y, x)| sample(y, x) as f64 / 255.0,
            )),
        };
        Ok(tensor)
    }
}
