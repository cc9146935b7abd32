pub mod image_codec;

pub use image_codec::{decode, EncodedImage, PixelGrid};
