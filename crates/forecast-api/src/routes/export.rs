//! 예측 내보내기 endpoint.
//!
//! - `GET /export-csv`
//! - `GET /export-excel`
//!
//! 범위에 데이터가 없으면 404를 반환합니다.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::debug;

use forecast_core::QueryView;

use crate::error::{no_data, ApiErrorResponse, ApiResult, IntoApiError};
use crate::export::{export_filename, to_csv, to_xlsx, ExportFormat};
use crate::routes::forecast::RangeQuery;
use crate::state::AppState;

async fn export_range(
    state: &AppState,
    query: &RangeQuery,
    format: ExportFormat,
) -> ApiResult<Response> {
    let range = query.parse().map_err(IntoApiError::into_api_error)?;

    let snapshot = state
        .cache
        .get_current(Utc::now())
        .await
        .map_err(IntoApiError::into_api_error)?;

    let points = QueryView::new(&snapshot).slice(&range);
    if points.is_empty() {
        return Err(no_data());
    }

    let bytes = match format {
        ExportFormat::Csv => to_csv(points),
        ExportFormat::Xlsx => to_xlsx(points),
    }
    .map_err(IntoApiError::into_api_error)?;

    let filename = export_filename(&state.config.forecast.export_prefix, &range, format);
    debug!(%filename, rows = points.len(), bytes = bytes.len(), "Forecast exported");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// 범위 예측을 CSV 파일로 내보냅니다.
#[utoipa::path(
    get,
    path = "/export-csv",
    tag = "export",
    params(RangeQuery),
    responses(
        (status = 200, description = "CSV 첨부 파일", body = String, content_type = "text/csv"),
        (status = 400, description = "날짜 파라미터 오류", body = ApiErrorResponse),
        (status = 404, description = "범위에 데이터 없음", body = ApiErrorResponse),
        (status = 503, description = "예측을 계산할 수 없음", body = ApiErrorResponse)
    )
)]
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Response> {
    export_range(&state, &query, ExportFormat::Csv).await
}

/// 범위 예측을 XLSX 파일로 내보냅니다 (시트 "Forecast").
#[utoipa::path(
    get,
    path = "/export-excel",
    tag = "export",
    params(RangeQuery),
    responses(
        (status = 200, description = "XLSX 첨부 파일", body = Vec<u8>,
         content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "날짜 파라미터 오류", body = ApiErrorResponse),
        (status = 404, description = "범위에 데이터 없음", body = ApiErrorResponse),
        (status = 503, description = "예측을 계산할 수 없음", body = ApiErrorResponse)
    )
)]
pub async fn export_excel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Response> {
    export_range(&state, &query, ExportFormat::Xlsx).await
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
    use forecast_core::DATE_FORMAT;
    use tower::ServiceExt;

    use crate::state::create_test_state;

    fn app() -> Router {
        Router::new()
            .route("/export-csv", get(export_csv))
            .route("/export-excel", get(export_excel))
            .with_state(Arc::new(create_test_state()))
    }

    fn offset(days: i64) -> String {
        (Utc::now().date_naive() + Duration::days(days))
            .format(DATE_FORMAT)
            .to_string()
    }

    async fn get_response(uri: &str) -> Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_export_csv() {
        let (start, end) = (offset(1), offset(5));
        let response = get_response(&format!("/export-csv?start_date={}&end_date={}", start, end)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(
            disposition,
            format!("attachment; filename=\"gold_forecast_{}_to_{}.csv\"", start, end)
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ds,yhat,yhat_lower,yhat_upper");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with(&start));
    }

    #[tokio::test]
    async fn test_export_excel() {
        let response = get_response(&format!(
            "/export-excel?start_date={}&end_date={}",
            offset(1),
            offset(30)
        ))
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            ExportFormat::Xlsx.content_type()
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..2], b"PK");
    }

    #[tokio::test]
    async fn test_export_empty_range_is_not_found() {
        let uri = format!("/export-csv?start_date={}&end_date={}", offset(200), offset(210));
        let response = get_response(&uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_missing_parameters() {
        let response = get_response("/export-excel").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
