use std::sync::Arc;

use grin_types::Label;
use tracing::debug;

use crate::error::InferenceError;
use crate::preprocess::ImageTensor;

/// A probability must be strictly above this to count as a smile.
pub const SMILE_THRESHOLD: f32 = 0.5;

/// Pre-trained smile model: preprocessed image in, probability of "smiling" out.
///
/// Loaded once at startup and shared by every request.
pub trait SmileModel: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<f32, InferenceError>;
}

pub fn label_for(probability: f32) -> Label {
    if probability > SMILE_THRESHOLD {
        Label::Smiling
    } else {
        Label::NotSmiling
    }
}

#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn SmileModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn SmileModel>) -> Self {
        Self { model }
    }

    pub fn classify(&self, input: &ImageTensor) -> Result<Label, InferenceError> {
        let probability = self.model.predict(input)?;
        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteProbability(probability));
        }

        let label = label_for(probability);
        debug!(probability, %label, "Classified image");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        probability: f32,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(probability: f32) -> Self {
            Self { probability, calls: AtomicUsize::new(0) }
        }
    }

    impl SmileModel for FixedModel {
        fn predict(&self, input: &ImageTensor) -> Result<f32, InferenceError> {
            assert_eq!(input.shape(), &[1, 64, 64, 3]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }
    }

    struct BrokenModel;

    impl SmileModel for BrokenModel {
        fn predict(&self, _input: &ImageTensor) -> Result<f32, InferenceError> {
            Err(InferenceError::Execution("graph exploded".into()))
        }
    }

    fn sample_input() -> ImageTensor {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
        preprocess(buf.get_ref()).unwrap()
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(label_for(0.5), Label::NotSmiling);
        assert_eq!(label_for(0.500001), Label::Smiling);
        assert_eq!(label_for(0.0), Label::NotSmiling);
        assert_eq!(label_for(1.0), Label::Smiling);
    }

    #[test]
    fn classifier_uses_model_probability() {
        let model = Arc::new(FixedModel::new(0.93));
        let classifier = Classifier::new(model.clone());
        assert_eq!(classifier.classify(&sample_input()).unwrap(), Label::Smiling);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let classifier = Classifier::new(Arc::new(FixedModel::new(0.12)));
        assert_eq!(classifier.classify(&sample_input()).unwrap(), Label::NotSmiling);
    }

    #[test]
    fn model_failure_is_an_inference_error() {
        let classifier = Classifier::new(Arc::new(BrokenModel));
        let err = classifier.classify(&sample_input()).unwrap_err();
        assert!(matches!(err, InferenceError::Execution(_)));
    }

    #[test]
    fn nan_probability_is_rejected() {
        let classifier = Classifier::new(Arc::new(FixedModel::new(f32::NAN)));
        let err = classifier.classify(&sample_input()).unwrap_err();
        assert!(matches!(err, InferenceError::NonFiniteProbability(_)));
    }
}
