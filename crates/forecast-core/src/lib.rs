//! # Forecast Core
//!
//! 가격 예측 서비스의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 과거 가격 시계열 (`PricePoint`, `HistorySeries`)
//! - 예측 결과 (`ForecastPoint`, `ForecastSnapshot`)
//! - 날짜 범위 조회 및 요약 통계 (`QueryView`)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
