//! 원자재 가격 예측 API 서버.
//!
//! 이 crate는 다음을 제공합니다:
//! - 예측 스냅샷 캐시 ([`cache::ForecastCache`])
//! - REST API 엔드포인트 및 HTML 미리보기
//! - CSV / XLSX 내보내기
//! - Prometheus 메트릭 및 OpenAPI 문서

pub mod cache;
pub mod error;
pub mod export;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use cache::{CacheError, CacheSettings, ForecastCache};
pub use error::{ApiErrorResponse, ApiResult};
pub use state::AppState;
