//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use forecast_core::RangeError;

use crate::cache::CacheError;
use crate::export::ExportError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "status": "error",
///   "code": "INVALID_RANGE",
///   "message": "Missing start_date parameter",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 항상 "error"
    pub status: String,
    /// 에러 코드 (예: "INVALID_RANGE", "NOT_FOUND", "FORECAST_UNAVAILABLE")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// ```
    /// use forecast_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NOT_FOUND", "No forecast data to export");
    /// assert_eq!(error.status, "error");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 에러를 HTTP 응답 튜플로 변환합니다.
pub trait IntoApiError {
    fn into_api_error(self) -> (StatusCode, Json<ApiErrorResponse>);
}

impl IntoApiError for RangeError {
    fn into_api_error(self) -> (StatusCode, Json<ApiErrorResponse>) {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("INVALID_RANGE", self.to_string())),
        )
    }
}

impl IntoApiError for CacheError {
    fn into_api_error(self) -> (StatusCode, Json<ApiErrorResponse>) {
        let body = match &self {
            CacheError::ColdStart(_) => ApiErrorResponse::new("FORECAST_UNAVAILABLE", self.to_string()),
            CacheError::StaleLimitExceeded {
                failures,
                last_error,
            } => ApiErrorResponse::with_details(
                "FORECAST_STALE",
                self.to_string(),
                serde_json::json!({
                    "consecutive_failures": failures,
                    "last_error": last_error,
                }),
            ),
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}

impl IntoApiError for ExportError {
    fn into_api_error(self) -> (StatusCode, Json<ApiErrorResponse>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("EXPORT_FAILED", self.to_string())),
        )
    }
}

/// 범위에 데이터가 없을 때의 404 응답.
pub fn no_data() -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new(
            "NOT_FOUND",
            "No forecast data in the requested range",
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RefreshError;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.status, "error");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_api_error_response_with_details() {
        let details = serde_json::json!({"field": "start_date"});
        let error = ApiErrorResponse::with_details("INVALID_RANGE", "Invalid input", details);
        assert_eq!(error.code, "INVALID_RANGE");
        assert!(error.details.is_some());
        assert!(error.timestamp.is_some());
    }

    #[test]
    fn test_error_json_omits_empty_fields() {
        let error = ApiErrorResponse::new("INVALID_RANGE", "bad");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains(r#""status":"error""#));
        assert!(json.contains(r#""code":"INVALID_RANGE""#));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_range_error_is_bad_request() {
        let (status, Json(body)) = RangeError::Missing("start_date").into_api_error();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Missing start_date parameter");
    }

    #[test]
    fn test_cache_errors_are_unavailable() {
        let (status, Json(body)) =
            CacheError::ColdStart(RefreshError::NoFuturePoints).into_api_error();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "FORECAST_UNAVAILABLE");

        let (status, Json(body)) = CacheError::StaleLimitExceeded {
            failures: 3,
            last_error: Some("engine".to_string()),
        }
        .into_api_error();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "FORECAST_STALE");
        assert_eq!(body.details.unwrap()["consecutive_failures"], 3);
    }
}
