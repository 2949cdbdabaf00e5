use image::imageops::{self, FilterType};
use image::DynamicImage;
use tract_onnx::prelude::tract_ndarray::{Array4, ArrayView4};

use crate::error::InvalidImageError;

/// Side length of the square model input.
pub const INPUT_SIZE: u32 = 64;

const CHANNELS: usize = 3;

/// Preprocessed model input: NHWC, shape `[1, 64, 64, 3]`, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.0
    }
}

/// Decode step only. The format is sniffed from the content, never the file name.
pub fn validate(bytes: &[u8]) -> Result<(), InvalidImageError> {
    decode(bytes).map(|_| ())
}

/// Decode and convert to model input.
pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor, InvalidImageError> {
    let image = decode(bytes)?;
    Ok(to_tensor(&image))
}

pub fn validate_and_preprocess(bytes: &[u8]) -> Result<ImageTensor, InvalidImageError> {
    preprocess(bytes)
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, InvalidImageError> {
    Ok(image::load_from_memory(bytes)?)
}

fn to_tensor(image: &DynamicImage) -> ImageTensor {
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let side = INPUT_SIZE as usize;
    let array = Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    });

    ImageTensor(array)
}
