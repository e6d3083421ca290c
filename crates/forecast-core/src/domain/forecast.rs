//! 예측 포인트와 예측 스냅샷.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::price::HistoryOrigin;
use crate::error::{DomainError, DomainResult};

/// 하루 단위 예측값과 신뢰 구간.
///
/// 불변식: `lower_bound <= predicted <= upper_bound`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ForecastPoint {
    /// 예측 대상 날짜
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String, format = Date))]
    date: NaiveDate,
    /// 예측 가격
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    predicted: Decimal,
    /// 신뢰 구간 하한
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    lower_bound: Decimal,
    /// 신뢰 구간 상한
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    upper_bound: Decimal,
}

impl ForecastPoint {
    /// 신뢰 구간 불변식을 검증하며 포인트를 생성합니다.
    pub fn new(
        date: NaiveDate,
        predicted: Decimal,
        lower_bound: Decimal,
        upper_bound: Decimal,
    ) -> DomainResult<Self> {
        if lower_bound > predicted || predicted > upper_bound {
            return Err(DomainError::BoundsViolation {
                date,
                lower: lower_bound,
                predicted,
                upper: upper_bound,
            });
        }
        Ok(Self {
            date,
            predicted,
            lower_bound,
            upper_bound,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn predicted(&self) -> Decimal {
        self.predicted
    }

    pub fn lower_bound(&self) -> Decimal {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Decimal {
        self.upper_bound
    }
}

/// 한 번의 갱신 사이클이 만든 불변 예측 결과.
///
/// 새 스냅샷은 이전 스냅샷을 통째로 대체하며, 부분 수정은 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSnapshot {
    points: Vec<ForecastPoint>,
    computed_at: DateTime<Utc>,
    origin: HistoryOrigin,
    history_len: usize,
}

impl ForecastSnapshot {
    /// 엔진 출력에서 `computed_at` 이후 날짜만 남겨 스냅샷을 만듭니다.
    ///
    /// 결과 포인트는 날짜가 엄격히 증가합니다 (같은 날짜는 첫 값 유지).
    pub fn from_curve(
        mut curve: Vec<ForecastPoint>,
        computed_at: DateTime<Utc>,
        origin: HistoryOrigin,
        history_len: usize,
    ) -> Self {
        let as_of = computed_at.date_naive();
        curve.retain(|p| p.date() > as_of);
        curve.sort_by_key(|p| p.date());
        curve.dedup_by_key(|p| p.date());

        Self {
            points: curve,
            computed_at,
            origin,
            history_len,
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn origin(&self) -> HistoryOrigin {
        self.origin
    }

    /// 학습에 사용된 과거 데이터 포인트 수
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 계산 이후 경과 시간. 시계가 뒤로 간 경우 0.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.computed_at).max(Duration::zero())
    }

    /// `now - computed_at >= cache_duration` 이면 만료.
    pub fn is_stale(&self, now: DateTime<Utc>, cache_duration: Duration) -> bool {
        now - self.computed_at >= cache_duration
    }
}
