use serde::{Deserialize, Serialize};

/// 活動序列的時間步數
pub const SEQUENCE_LENGTH: usize = 100;
/// 每個時間步的感測器通道數
pub const SENSOR_CHANNELS: usize = 6;
pub const SAMPLE_RATE: u32 = 16_000;
pub const N_MELS: usize = 128;
/// 關鍵字 ("go") 在分類器輸出中的索引
pub const KEYWORD_CLASS_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskQuery {
    pub lat: f64,
    pub lon: f64,
    pub year: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub predicted_risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPrediction {
    pub predicted_activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDetection {
    pub keyword_detected: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
