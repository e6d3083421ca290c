//! 합성 과거 데이터 생성기.
//!
//! 외부 피드가 실패하거나 데이터가 부족할 때 예측 엔진이 학습할 수 있도록
//! 결정적인 일별 시계열을 만듭니다. 값은 `1800 + 5i + 20(i mod 7)` 입니다.

use chrono::{Duration, NaiveDate};
use forecast_core::{HistoryOrigin, HistorySeries, PricePoint};
use rust_decimal::Decimal;

/// 기본 생성 포인트 수
pub const DEFAULT_FALLBACK_POINTS: usize = 500;

const BASE_PRICE: i64 = 1800;
const DAILY_STEP: i64 = 5;
const WEEKLY_AMPLITUDE: i64 = 20;

/// 결정적 합성 시계열 생성기.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackGenerator {
    points: usize,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self {
            points: DEFAULT_FALLBACK_POINTS,
        }
    }
}

impl FallbackGenerator {
    /// 생성 개수는 최소 `min_points` 이상으로 보정됩니다.
    pub fn new(points: usize, min_points: usize) -> Self {
        Self {
            points: points.max(min_points).max(1),
        }
    }

    pub fn points(&self) -> usize {
        self.points
    }

    /// `end`를 마지막 날짜로 하는 연속 일별 시계열을 생성합니다.
    pub fn generate(&self, end: NaiveDate) -> HistorySeries {
        let last = self.points as i64 - 1;
        let points = (0..self.points as i64)
            .map(|i| {
                let date = end - Duration::days(last - i);
                let value = BASE_PRICE + DAILY_STEP * i + WEEKLY_AMPLITUDE * (i % 7);
                PricePoint::new(date, Decimal::from(value))
            })
            .collect();

        HistorySeries::from_unsorted(points, HistoryOrigin::Fallback)
    }
}
