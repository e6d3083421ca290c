//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/` - 향후 30일 예측 미리보기 (HTML)
//! - `/api/forecast` - 날짜 범위 예측 조회 (JSON)
//! - `/export-csv` - 날짜 범위 CSV 내보내기
//! - `/export-excel` - 날짜 범위 XLSX 내보내기
//! - `/health` - 캐시 상태 (갱신 유발 없음)
//! - `/health/ready` - readiness probe

pub mod export;
pub mod forecast;
pub mod health;
pub mod page;

pub use export::{export_csv, export_excel};
pub use forecast::{get_forecast, ForecastResponse, ForecastRow, RangeQuery, SummaryDto};
pub use health::{health_router, CacheHealth, ComponentStatus, HealthResponse, ReadyResponse};
pub use page::index;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/api/forecast", get(get_forecast))
        .route("/export-csv", get(export_csv))
        .route("/export-excel", get(export_excel))
        .nest("/health", health_router())
}
