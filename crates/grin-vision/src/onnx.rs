use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use crate::classifier::SmileModel;
use crate::error::{InferenceError, ModelLoadError};
use crate::preprocess::{ImageTensor, INPUT_SIZE};

/// ONNX export of the smile model, run with tract.
pub struct OnnxSmileModel {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxSmileModel {
    /// Load, pin the input to `f32 [1, 64, 64, 3]`, optimize.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let side = INPUT_SIZE as usize;
        let load_err = |e: TractError| ModelLoadError {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)))
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        info!("Smile model loaded from {}", path.display());
        Ok(Self { plan })
    }
}

impl SmileModel for OnnxSmileModel {
    fn predict(&self, input: &ImageTensor) -> Result<f32, InferenceError> {
        let tensor: Tensor = input.clone().into_array().into_tensor();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Execution(format!("{e:#}")))?;

        let first = outputs.first().ok_or(InferenceError::MissingOutput)?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Execution(format!("{e:#}")))?;

        view.iter().next().copied().ok_or(InferenceError::MissingOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use prost::Message;
    use tract_onnx::pb::{
        GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TypeProto, ValueInfoProto,
        tensor_proto, type_proto,
    };

    use crate::classifier::Classifier;
    use crate::preprocess::validate_and_preprocess;
    use grin_types::Label;

    /// A one-node graph whose "probability" is the mean of all input values.
    fn write_mean_model() -> PathBuf {
        let input_type = TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: tensor_proto::DataType::Float as i32,
                shape: None,
            })),
            ..Default::default()
        };
        let model = ModelProto {
            ir_version: 7,
            opset_import: vec![OperatorSetIdProto { domain: String::new(), version: 13 }],
            graph: Some(GraphProto {
                name: "mean".into(),
                node: vec![NodeProto {
                    op_type: "ReduceMean".into(),
                    input: vec!["input".into()],
                    output: vec!["output".into()],
                    ..Default::default()
                }],
                input: vec![ValueInfoProto {
                    name: "input".into(),
                    r#type: Some(input_type),
                    ..Default::default()
                }],
                output: vec![ValueInfoProto { name: "output".into(), ..Default::default() }],
                ..Default::default()
            }),
            ..Default::default()
        };

        let path = std::env::temp_dir().join(format!("grin_mean_{}.onnx", uuid::Uuid::new_v4()));
        std::fs::write(&path, model.encode_to_vec()).unwrap();
        path
    }

    fn solid_png(rgb: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(10, 10, Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn loaded_model_runs_on_preprocessed_images() {
        let path = write_mean_model();
        let model = OnnxSmileModel::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let red = validate_and_preprocess(&solid_png([255, 0, 0])).unwrap();
        let white = validate_and_preprocess(&solid_png([255, 255, 255])).unwrap();

        let p_red = model.predict(&red).unwrap();
        let p_white = model.predict(&white).unwrap();
        assert!((p_red - 1.0 / 3.0).abs() < 1e-5, "red mean was {p_red}");
        assert!((p_white - 1.0).abs() < 1e-5, "white mean was {p_white}");

        let classifier = Classifier::new(std::sync::Arc::new(model));
        assert_eq!(classifier.classify(&red).unwrap(), Label::NotSmiling);
        assert_eq!(classifier.classify(&white).unwrap(), Label::Smiling);
    }

    #[test]
    fn missing_model_file_fails_to_load() {
        let path = std::env::temp_dir().join(format!("grin_missing_{}.onnx", uuid::Uuid::new_v4()));
        let err = OnnxSmileModel::load(&path).err().unwrap();
        assert_eq!(err.path, path);
        assert!(err.to_string().starts_with("Failed to load model from"));
    }

    #[test]
    fn garbage_model_file_fails_to_load() {
        let path = std::env::temp_dir().join(format!("grin_garbage_{}.onnx", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not a protobuf at all").unwrap();

        assert!(OnnxSmileModel::load(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
