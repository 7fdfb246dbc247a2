//! Small HTTP client used by the `check_activity` and `check_keyword` tools.

pub mod samples;

use crate::domain::model::SENSOR_CHANNELS;
use crate::utils::error::{AegisError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Serialize)]
struct DataPayload<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Debug, Clone)]
pub struct AegisClient {
    base_url: Url,
    client: Client,
}

impl AegisClient {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("server_url", base_url)?;
        let base_url = Url::parse(base_url).map_err(|e| AegisError::ConfigError {
            message: format!("invalid server URL: {}", e),
        })?;

        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    /// 傳送 100x6 的感測器序列
    pub async fn check_activity(&self, sequence: &[[f32; SENSOR_CHANNELS]]) -> Result<Value> {
        self.post("check_activity", &sequence).await
    }

    /// 傳送 16 kHz 單聲道音訊樣本
    pub async fn check_audio(&self, samples: &[f32]) -> Result<Value> {
        self.post("check_audio", &samples).await
    }

    /// 不論狀態碼都回傳伺服器的 JSON 內容
    async fn post<T: Serialize>(&self, endpoint: &str, data: &T) -> Result<Value> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| AegisError::ConfigError {
                message: format!("invalid endpoint '{}': {}", endpoint, e),
            })?;

        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(&DataPayload { data })
            .send()
            .await?;

        tracing::debug!("Response status: {}", response.status());
        Ok(response.json().await?)
    }
}
