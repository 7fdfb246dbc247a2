use crate::core::tensor::Tensor;
use crate::domain::ports::InferenceModel;
use crate::utils::error::{AegisError, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor as OrtTensor;
use std::path::Path;
use std::sync::Mutex;

/// ONNX Runtime 模型。使用圖中的第一個輸入與第一個輸出。
pub struct OnnxModel {
    name: String,
    input_name: String,
    output_name: String,
    // 執行推論需要 &mut Session
    session: Mutex<Session>,
}

impl OnnxModel {
    pub fn load<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AegisError::ConfigError {
                message: format!("{} model file not found: {}", name, path.display()),
            });
        }

        tracing::debug!("Loading {} model from {}", name, path.display());
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| AegisError::ConfigError {
                message: format!("{} model has no inputs", name),
            })?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| AegisError::ConfigError {
                message: format!("{} model has no outputs", name),
            })?;

        tracing::info!(
            "✅ Loaded {} model ({} -> {})",
            name,
            input_name,
            output_name
        );

        Ok(Self {
            name: name.to_string(),
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }
}

impl InferenceModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: &Tensor) -> Result<Tensor> {
        let value = OrtTensor::from_array((input.shape().to_vec(), input.data().to_vec()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AegisError::inference(format!("{} session lock poisoned", self.name)))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => value])?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        Tensor::new(shape, data.to_vec()).map_err(|e| {
            AegisError::inference(format!("{} model produced a malformed output: {}", self.name, e))
        })
    }
}
