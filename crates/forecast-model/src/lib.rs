//! 가격 예측 엔진.
//!
//! 과거 일별 종가 시계열을 학습해 향후 N일의 예측값과 신뢰 구간을 생성합니다.
//!
//! # 구성
//!
//! - [`ForecastEngine`]: 엔진 트레잇 (동기, CPU 바운드)
//! - [`SeasonalTrendEngine`]: 선형 추세 + 요일 계절성 모델

pub mod engine;
pub mod error;
pub mod seasonal;

pub use engine::ForecastEngine;
pub use error::{EngineError, EngineResult};
pub use seasonal::{SeasonalTrendConfig, SeasonalTrendEngine};
