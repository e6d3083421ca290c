//! 예측 조회 endpoint.
//!
//! `GET /api/forecast?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
//!
//! 응답 행은 기존 프론트엔드와 호환되도록 `ds`, `yhat`, `yhat_lower`, `yhat_upper`
//! 필드를 사용하며 가격은 JSON 숫자입니다.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use forecast_core::{DateRange, ForecastPoint, ForecastSummary, QueryView, RangeError, DATE_FORMAT};

use crate::error::{ApiErrorResponse, ApiResult, IntoApiError};
use crate::state::AppState;

/// 날짜 범위 쿼리 파라미터.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// 시작일 (YYYY-MM-DD, 포함)
    pub start_date: Option<String>,
    /// 종료일 (YYYY-MM-DD, 포함)
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn parse(&self) -> Result<DateRange, RangeError> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// 예측 행.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastRow {
    /// 날짜 (YYYY-MM-DD)
    pub ds: String,
    /// 예측가
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub yhat: Decimal,
    /// 신뢰 구간 하한
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub yhat_lower: Decimal,
    /// 신뢰 구간 상한
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub yhat_upper: Decimal,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            ds: point.date().format(DATE_FORMAT).to_string(),
            yhat: point.predicted(),
            yhat_lower: point.lower_bound(),
            yhat_upper: point.upper_bound(),
        }
    }
}

/// 범위 요약 통계.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryDto {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub avg_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub max_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub min_price: Decimal,
    pub max_date: String,
    pub min_date: String,
}

impl From<ForecastSummary> for SummaryDto {
    fn from(summary: ForecastSummary) -> Self {
        Self {
            avg_price: summary.average,
            max_price: summary.max.price,
            min_price: summary.min.price,
            max_date: summary.max.date.format(DATE_FORMAT).to_string(),
            min_date: summary.min.date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// 예측 조회 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastResponse {
    /// 항상 "success"
    pub status: String,
    /// 날짜 오름차순 예측 행
    pub data: Vec<ForecastRow>,
    /// 요약 통계. 범위에 데이터가 없으면 null
    pub summary: Option<SummaryDto>,
}

impl ForecastResponse {
    pub fn from_points(points: &[ForecastPoint]) -> Self {
        Self {
            status: "success".to_string(),
            data: points.iter().map(ForecastRow::from).collect(),
            summary: QueryView::summarize(points).map(SummaryDto::from),
        }
    }
}

/// 날짜 범위의 예측과 요약을 조회합니다.
#[utoipa::path(
    get,
    path = "/api/forecast",
    tag = "forecast",
    params(RangeQuery),
    responses(
        (status = 200, description = "범위 예측 조회 성공", body = ForecastResponse),
        (status = 400, description = "날짜 파라미터 누락/형식 오류/역전", body = ApiErrorResponse),
        (status = 503, description = "예측을 계산할 수 없음", body = ApiErrorResponse)
    )
)]
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<ForecastResponse>> {
    let range = query.parse().map_err(IntoApiError::into_api_error)?;

    let snapshot = state
        .cache
        .get_current(Utc::now())
        .await
        .map_err(IntoApiError::into_api_error)?;

    let points = QueryView::new(&snapshot).slice(&range);
    Ok(Json(ForecastResponse::from_points(points)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use chrono::Duration;
    use tower::ServiceExt;

    use crate::state::create_test_state;

    fn app() -> Router {
        Router::new()
            .route("/api/forecast", get(get_forecast))
            .with_state(Arc::new(create_test_state()))
    }

    async fn call(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn offset(days: i64) -> String {
        (Utc::now().date_naive() + Duration::days(days))
            .format(DATE_FORMAT)
            .to_string()
    }

    #[tokio::test]
    async fn test_forecast_range() {
        let uri = format!(
            "/api/forecast?start_date={}&end_date={}",
            offset(10),
            offset(16)
        );
        let (status, json) = call(&uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");

        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 7);
        assert_eq!(data[0]["ds"], offset(10));
        assert!(data[0]["yhat"].is_f64());

        let summary = &json["summary"];
        assert!(summary["max_price"].as_f64().unwrap() >= summary["avg_price"].as_f64().unwrap());
        assert!(summary["avg_price"].as_f64().unwrap() >= summary["min_price"].as_f64().unwrap());
    }

    #[tokio::test]
    async fn test_forecast_range_beyond_horizon_is_empty() {
        let uri = format!(
            "/api/forecast?start_date={}&end_date={}",
            offset(95),
            offset(100)
        );
        let (status, json) = call(&uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
        assert!(json["summary"].is_null());
    }

    #[tokio::test]
    async fn test_forecast_missing_parameter() {
        let (status, json) = call("/api/forecast?start_date=2025-01-01").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Missing end_date parameter");
    }

    #[tokio::test]
    async fn test_forecast_invalid_format() {
        let (status, json) =
            call("/api/forecast?start_date=2025/01/01&end_date=2025-02-01").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_forecast_inverted_range() {
        let (status, _) = call("/api/forecast?start_date=2025-02-01&end_date=2025-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
