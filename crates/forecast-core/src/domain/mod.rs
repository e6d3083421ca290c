//! 도메인 모델.
//!
//! - [`price`]: 과거 가격 시계열
//! - [`forecast`]: 예측 포인트와 스냅샷
//! - [`query`]: 스냅샷 날짜 범위 조회 및 요약 통계

pub mod forecast;
pub mod price;
pub mod query;

pub use forecast::{ForecastPoint, ForecastSnapshot};
pub use price::{HistoryOrigin, HistorySeries, PricePoint};
pub use query::{DateRange, ForecastSummary, PriceExtreme, QueryView, DATE_FORMAT};
