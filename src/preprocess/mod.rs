pub mod normalize;
pub mod tensor;

pub use normalize::{Preprocessor, ResizeFilter};
pub use tensor::{DType, NormalizedTensor, TensorSpec, INPUT_SHAPE};
