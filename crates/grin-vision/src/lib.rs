//! Image preprocessing and smile classification.
//!
//! Uploads are decoded and turned into a `[1, 64, 64, 3]` tensor of `f32`
//! values in `[0, 1]`, which is then handed to a [`SmileModel`]. The model is
//! opaque: anything that maps that tensor to a single probability will do.

pub mod classifier;
pub mod error;
pub mod onnx;
pub mod preprocess;

pub use classifier::{Classifier, SMILE_THRESHOLD, SmileModel, label_for};
pub use error::{InferenceError, InvalidImageError, ModelLoadError};
pub use onnx::OnnxSmileModel;
pub use preprocess::{INPUT_SIZE, ImageTensor, preprocess, validate, validate_and_preprocess};
