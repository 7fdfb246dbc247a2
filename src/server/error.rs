use crate::domain::model::ErrorBody;
use crate::utils::error::AegisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// 輸入錯誤加上端點專屬的前綴並回應 400，其餘回應 500
    pub fn from_service(err: AegisError, prefix: &str) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(format!("{} {}", prefix, err))
        } else {
            ApiError::Internal(err.to_string())
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::BadRequest(message) => tracing::warn!("❌ Rejected request: {}", message),
            ApiError::Internal(message) => tracing::error!("❌ Inference failed: {}", message),
        }

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_service_prefixes_client_errors() {
        let err = ApiError::from_service(
            AegisError::invalid_input("cannot reshape array of size 5 into shape (1, 100, 6)"),
            "Invalid input data.",
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Invalid input data. cannot reshape array of size 5 into shape (1, 100, 6)"
        );
    }

    #[test]
    fn test_from_service_keeps_inference_errors_internal() {
        let err = ApiError::from_service(AegisError::inference("no outputs"), "Invalid input data.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Inference error: no outputs");
    }
}
