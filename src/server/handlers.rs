use super::error::ApiError;
use crate::core::service::InferenceService;
use crate::domain::model::{ActivityPrediction, KeywordDetection, RiskPrediction, RiskQuery};
use crate::utils::error::{AegisError, Result};
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    Json,
};
use serde_json::Value;

const INVALID_PARAMETERS: &str = "Invalid parameters.";
const INVALID_INPUT: &str = "Invalid input data.";
const INVALID_AUDIO: &str = "Invalid audio data processing.";

/// GET /predict?lat=<float>&lon=<float>&year=<int>
pub async fn predict(
    State(service): State<InferenceService>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Json<RiskPrediction>, ApiError> {
    let query = parse_risk_query(query.as_deref().unwrap_or(""))
        .ok_or_else(|| ApiError::BadRequest(INVALID_PARAMETERS.to_string()))?;

    let prediction = run_blocking(move || service.predict_risk(query), INVALID_PARAMETERS).await?;
    Ok(Json(prediction))
}

/// POST /check_activity  {"data": <100x6 array>}
pub async fn check_activity(
    State(service): State<InferenceService>,
    body: Bytes,
) -> std::result::Result<Json<ActivityPrediction>, ApiError> {
    let data = extract_data(&body).map_err(|e| ApiError::from_service(e, INVALID_INPUT))?;

    let prediction = run_blocking(move || service.classify_activity(&data), INVALID_INPUT).await?;
    Ok(Json(prediction))
}

/// POST /check_audio  {"data": <raw samples>}
pub async fn check_audio(
    State(service): State<InferenceService>,
    body: Bytes,
) -> std::result::Result<Json<KeywordDetection>, ApiError> {
    let data = extract_data(&body).map_err(|e| ApiError::from_service(e, INVALID_AUDIO))?;

    let detection = run_blocking(move || service.detect_keyword(&data), INVALID_AUDIO).await?;
    Ok(Json(detection))
}

/// 取查詢字串中每個參數的第一個值；缺少或無法解析時回傳 None
pub fn parse_risk_query(raw: &str) -> Option<RiskQuery> {
    let mut lat = None;
    let mut lon = None;
    let mut year = None;

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "lat" if lat.is_none() => lat = Some(value.into_owned()),
            "lon" if lon.is_none() => lon = Some(value.into_owned()),
            "year" if year.is_none() => year = Some(value.into_owned()),
            _ => {}
        }
    }

    Some(RiskQuery {
        lat: lat?.trim().parse().ok()?,
        lon: lon?.trim().parse().ok()?,
        year: year?.trim().parse().ok()?,
    })
}

fn extract_data(body: &[u8]) -> Result<Value> {
    let mut payload: Value = serde_json::from_slice(body)
        .map_err(|e| AegisError::invalid_input(format!("malformed JSON body: {}", e)))?;

    payload
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| AegisError::invalid_input("missing 'data' field"))
}

async fn run_blocking<T, F>(task: F, prefix: &'static str) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))?
        .map_err(|e| ApiError::from_service(e, prefix))
}
