use crate::adapters::onnx::OnnxModel;
use crate::core::label_encoder::LabelEncoder;
use crate::core::spectrogram::MelSpectrogram;
use crate::core::tensor::{argmax, format_shape, round_to, Tensor};
use crate::domain::model::{
    ActivityPrediction, KeywordDetection, RiskPrediction, RiskQuery, KEYWORD_CLASS_INDEX,
    SENSOR_CHANNELS, SEQUENCE_LENGTH,
};
use crate::domain::ports::{ConfigProvider, InferenceModel};
use crate::utils::error::{AegisError, Result};
use serde_json::Value;
use std::sync::Arc;

/// 三個端點共用的模型集合，啟動時載入一次，之後唯讀
#[derive(Clone)]
pub struct InferenceService {
    risk_model: Arc<dyn InferenceModel>,
    activity_model: Arc<dyn InferenceModel>,
    keyword_model: Arc<dyn InferenceModel>,
    label_encoder: Arc<LabelEncoder>,
    spectrogram: Arc<MelSpectrogram>,
}

impl InferenceService {
    pub fn new(
        risk_model: Arc<dyn InferenceModel>,
        activity_model: Arc<dyn InferenceModel>,
        keyword_model: Arc<dyn InferenceModel>,
        label_encoder: LabelEncoder,
    ) -> Self {
        Self {
            risk_model,
            activity_model,
            keyword_model,
            label_encoder: Arc::new(label_encoder),
            spectrogram: Arc::new(MelSpectrogram::default()),
        }
    }

    /// 依設定載入所有模型與標籤編碼器
    pub fn load<C: ConfigProvider>(config: &C) -> Result<Self> {
        tracing::info!("Loading all models...");

        let risk_model = OnnxModel::load("risk", config.risk_model_path())?;
        let activity_model = OnnxModel::load("activity", config.activity_model_path())?;
        let keyword_model = OnnxModel::load("keyword", config.keyword_model_path())?;
        let label_encoder = LabelEncoder::from_file(config.label_encoder_path())?;
        tracing::debug!("Label encoder has {} classes", label_encoder.classes().len());

        tracing::info!("All models loaded successfully.");
        Ok(Self::new(
            Arc::new(risk_model),
            Arc::new(activity_model),
            Arc::new(keyword_model),
            label_encoder,
        ))
    }

    pub fn predict_risk(&self, query: RiskQuery) -> Result<RiskPrediction> {
        let input = Tensor::new(
            vec![1, 3],
            vec![query.lat as f32, query.lon as f32, query.year as f32],
        )?;
        let output = self.risk_model.predict(&input)?;
        let score = output.data().first().copied().ok_or_else(|| {
            AegisError::inference(format!("{} model returned no values", self.risk_model.name()))
        })?;

        tracing::debug!(lat = query.lat, lon = query.lon, year = query.year, score, "risk prediction");
        Ok(RiskPrediction {
            predicted_risk_score: round_to(score as f64, 2),
        })
    }

    /// `data` 為 100x6 的數值序列 (巢狀或攤平皆可)
    pub fn classify_activity(&self, data: &Value) -> Result<ActivityPrediction> {
        let input = Tensor::from_nested_json(data)?.reshape(vec![
            1,
            SEQUENCE_LENGTH,
            SENSOR_CHANNELS,
        ])?;

        let output = self.activity_model.predict(&input)?;
        let index = self.best_class(self.activity_model.as_ref(), &output)?;
        let label = self.label_encoder.inverse_transform(index)?;

        tracing::debug!(index, label, "activity classified");
        Ok(ActivityPrediction {
            predicted_activity: label.to_string(),
        })
    }

    /// `data` 為 16 kHz 的一維音訊樣本
    pub fn detect_keyword(&self, data: &Value) -> Result<KeywordDetection> {
        let samples = audio_samples(data)?;
        let input = self.spectrogram.compute(&samples)?;

        let output = self.keyword_model.predict(&input)?;
        let index = self.best_class(self.keyword_model.as_ref(), &output)?;
        let confidence = output.first_row()[index];

        tracing::debug!(index, confidence, "keyword classifier output");
        Ok(KeywordDetection {
            keyword_detected: index == KEYWORD_CLASS_INDEX,
            confidence: round_to(confidence as f64, 3),
        })
    }

    fn best_class(&self, model: &dyn InferenceModel, output: &Tensor) -> Result<usize> {
        argmax(output.first_row()).ok_or_else(|| {
            AegisError::inference(format!("{} model returned no class scores", model.name()))
        })
    }
}

/// 一維浮點樣本陣列；全為整數的陣列視為未正規化的音訊而拒絕
fn audio_samples(data: &Value) -> Result<Vec<f64>> {
    let items = match data {
        Value::Array(items) => items,
        _ => {
            let shape = Tensor::from_nested_json(data)?;
            return Err(not_one_dimensional(shape.shape()));
        }
    };

    let mut samples = Vec::with_capacity(items.len());
    let mut has_float = false;
    for item in items {
        match item {
            Value::Number(n) => {
                has_float |= n.is_f64();
                let v = n.as_f64().ok_or_else(|| {
                    AegisError::invalid_input(format!("unsupported number: {}", n))
                })?;
                samples.push(v);
            }
            _ => {
                let shape = Tensor::from_nested_json(data)?;
                return Err(not_one_dimensional(shape.shape()));
            }
        }
    }

    if !samples.is_empty() && !has_float {
        return Err(AegisError::invalid_input("Audio data must be floating-point"));
    }
    Ok(samples)
}

fn not_one_dimensional(shape: &[usize]) -> AegisError {
    AegisError::invalid_input(format!(
        "expected a 1-D array of samples, got shape {}",
        format_shape(shape)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// 回傳固定輸出並記錄收到的輸入
    struct FixedModel {
        output: Tensor,
        seen_shapes: Mutex<Vec<Vec<usize>>>,
        seen_data: Mutex<Vec<Vec<f32>>>,
    }

    impl FixedModel {
        fn new(shape: Vec<usize>, data: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                output: Tensor::new(shape, data).unwrap(),
                seen_shapes: Mutex::new(Vec::new()),
                seen_data: Mutex::new(Vec::new()),
            })
        }
    }

    impl InferenceModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, input: &Tensor) -> Result<Tensor> {
            self.seen_shapes.lock().unwrap().push(input.shape().to_vec());
            self.seen_data.lock().unwrap().push(input.data().to_vec());
            Ok(self.output.clone())
        }
    }

    fn labels() -> LabelEncoder {
        LabelEncoder::new(vec!["falling".into(), "sitting".into(), "walking".into()]).unwrap()
    }

    fn service(
        risk: Arc<FixedModel>,
        activity: Arc<FixedModel>,
        keyword: Arc<FixedModel>,
    ) -> InferenceService {
        InferenceService::new(risk, activity, keyword, labels())
    }

    fn default_service() -> InferenceService {
        service(
            FixedModel::new(vec![1, 1], vec![0.7391]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
            FixedModel::new(vec![1, 4], vec![0.05, 0.1, 0.81234, 0.03766]),
        )
    }

    #[test]
    fn test_predict_risk_rounds_to_two_decimals() {
        let risk = FixedModel::new(vec![1, 1], vec![0.7391]);
        let svc = service(
            risk.clone(),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
        );

        let prediction = svc
            .predict_risk(RiskQuery {
                lat: 34.05,
                lon: -118.25,
                year: 2024,
            })
            .unwrap();

        assert_eq!(prediction.predicted_risk_score, 0.74);
        assert_eq!(risk.seen_shapes.lock().unwrap()[0], vec![1, 3]);
        assert_eq!(
            risk.seen_data.lock().unwrap()[0],
            vec![34.05f32, -118.25, 2024.0]
        );
    }

    #[test]
    fn test_classify_activity_maps_argmax_to_label() {
        let activity = FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]);
        let svc = service(
            FixedModel::new(vec![1], vec![0.0]),
            activity.clone(),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
        );

        let data = json!(vec![vec![0.5f32; 6]; 100]);
        let prediction = svc.classify_activity(&data).unwrap();

        assert_eq!(prediction.predicted_activity, "walking");
        assert_eq!(activity.seen_shapes.lock().unwrap()[0], vec![1, 100, 6]);
    }

    #[test]
    fn test_classify_activity_rejects_wrong_shape_as_input_error() {
        let data = json!(vec![vec![0.5f32; 6]; 99]);
        let err = default_service().classify_activity(&data).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("(1, 100, 6)"));
    }

    #[test]
    fn test_unknown_class_index_is_inference_error() {
        let svc = service(
            FixedModel::new(vec![1], vec![0.0]),
            FixedModel::new(vec![1, 5], vec![0.0, 0.0, 0.0, 0.0, 1.0]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
        );
        let err = svc
            .classify_activity(&json!(vec![0.0f32; 600]))
            .unwrap_err();
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_detect_keyword_at_index_two() {
        let keyword = FixedModel::new(vec![1, 4], vec![0.05, 0.1, 0.81234, 0.03766]);
        let svc = service(
            FixedModel::new(vec![1], vec![0.0]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
            keyword.clone(),
        );

        let detection = svc.detect_keyword(&json!(vec![0.01f32; 16_000])).unwrap();

        assert!(detection.keyword_detected);
        assert_eq!(detection.confidence, 0.812);
        assert_eq!(keyword.seen_shapes.lock().unwrap()[0], vec![1, 128, 32, 1]);
    }

    #[test]
    fn test_other_word_is_not_keyword() {
        let svc = service(
            FixedModel::new(vec![1], vec![0.0]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
            FixedModel::new(vec![1, 4], vec![0.6, 0.1, 0.2, 0.1]),
        );

        let detection = svc.detect_keyword(&json!([0.1, -0.2, 0.3])).unwrap();
        assert!(!detection.keyword_detected);
        assert_eq!(detection.confidence, 0.6);
    }

    #[test]
    fn test_detect_keyword_rejects_bad_audio() {
        let svc = default_service();
        assert!(svc.detect_keyword(&json!([])).unwrap_err().is_client_error());
        assert!(svc
            .detect_keyword(&json!([[0.1, 0.2], [0.3, 0.4]]))
            .unwrap_err()
            .is_client_error());
        assert!(svc
            .detect_keyword(&json!("samples"))
            .unwrap_err()
            .is_client_error());
    }

    #[test]
    fn test_detect_keyword_requires_floating_point_samples() {
        let svc = default_service();
        let err = svc.detect_keyword(&json!([0, 1, -1, 0, 2])).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Audio data must be floating-point");

        let keyword = FixedModel::new(vec![1, 4], vec![0.05, 0.1, 0.81234, 0.03766]);
        let svc = service(
            FixedModel::new(vec![1], vec![0.0]),
            FixedModel::new(vec![1, 3], vec![0.1, 0.2, 0.7]),
            keyword.clone(),
        );
        assert!(svc.detect_keyword(&json!([0, 0.5, -1, 0.25])).is_ok());
        assert_eq!(keyword.seen_shapes.lock().unwrap()[0], vec![1, 128, 1, 1]);
    }
}
