//! 과거 가격 데이터 소스.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 시세 피드를 감싸는 [`HistorySource`] 트레잇
//! - Yahoo Finance 기반 구현 [`YahooHistorySource`]
//! - 피드 실패 시 사용하는 결정적 합성 데이터 [`FallbackGenerator`]

pub mod error;
pub mod fallback;
pub mod source;
pub mod yahoo;

pub use error::{HistoryError, Result};
pub use fallback::FallbackGenerator;
pub use source::{HistoryPeriod, HistorySource};
pub use yahoo::YahooHistorySource;
