use crate::core::tensor::Tensor;
use crate::utils::error::Result;
use std::path::PathBuf;

/// 已載入的預訓練模型。載入後唯讀，可跨請求共用。
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, input: &Tensor) -> Result<Tensor>;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn debug(&self) -> bool;
    fn risk_model_path(&self) -> PathBuf;
    fn activity_model_path(&self) -> PathBuf;
    fn keyword_model_path(&self) -> PathBuf;
    fn label_encoder_path(&self) -> PathBuf;

    /// 綁定位址，例如 127.0.0.1:5000
    fn bind_address(&self) -> String {
        if self.host().contains(':') {
            format!("[{}]:{}", self.host(), self.port())
        } else {
            format!("{}:{}", self.host(), self.port())
        }
    }
}
