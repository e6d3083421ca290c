//! 스냅샷 조회 뷰.
//!
//! 스냅샷을 수정하지 않고 날짜 범위 조회, 미리보기, 요약 통계를 제공합니다.
//! 범위 결과가 비어 있는 것은 에러가 아니며, 요약은 `None`으로 표현됩니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::forecast::{ForecastPoint, ForecastSnapshot};
use crate::error::RangeError;

/// 요청 날짜 형식
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 양 끝을 포함하는 날짜 범위. 항상 `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// `start > end` 이면 `RangeError::Inverted`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// 쿼리 파라미터 문자열에서 범위를 파싱합니다.
    ///
    /// 빈 문자열은 누락으로 취급합니다.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, RangeError> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, RangeError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(value) = raw else {
        return Err(RangeError::Missing(field));
    };

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| RangeError::InvalidFormat {
        field,
        value: value.to_string(),
    })
}

/// 최고/최저 예측가와 해당 날짜.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceExtreme {
    pub date: NaiveDate,
    pub price: Decimal,
}

/// `predicted` 값에 대한 요약 통계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSummary {
    /// 평균 예측가 (소수점 2자리 반올림)
    pub average: Decimal,
    /// 최고 예측가
    pub max: PriceExtreme,
    /// 최저 예측가
    pub min: PriceExtreme,
}

/// 스냅샷에 대한 읽기 전용 조회 뷰.
#[derive(Debug, Clone, Copy)]
pub struct QueryView<'a> {
    snapshot: &'a ForecastSnapshot,
}

impl<'a> QueryView<'a> {
    pub fn new(snapshot: &'a ForecastSnapshot) -> Self {
        Self { snapshot }
    }

    /// `start <= date <= end` 인 포인트를 날짜 순서대로 반환합니다.
    pub fn slice(&self, range: &DateRange) -> &'a [ForecastPoint] {
        let points = self.snapshot.points();
        // 스냅샷 포인트는 날짜가 엄격히 증가하므로 이진 탐색으로 경계 계산
        let lo = points.partition_point(|p| p.date() < range.start());
        let hi = points.partition_point(|p| p.date() <= range.end());
        &points[lo..hi.max(lo)]
    }

    /// 날짜 순서상 처음 `n`개 포인트.
    pub fn head(&self, n: usize) -> &'a [ForecastPoint] {
        let points = self.snapshot.points();
        &points[..n.min(points.len())]
    }

    /// 요약 통계. 포인트가 없으면 `None`.
    ///
    /// 최고/최저값이 여러 날짜에 걸쳐 같으면 가장 이른 날짜를 사용합니다.
    /// 평균과 최고/최저가는 모두 소수점 둘째 자리로 반올림되므로
    /// `min.price <= average <= max.price`가 유지됩니다.
    pub fn summarize(points: &[ForecastPoint]) -> Option<ForecastSummary> {
        let (first, rest) = points.split_first()?;

        let mut total = first.predicted();
        let mut max = PriceExtreme {
            date: first.date(),
            price: first.predicted(),
        };
        let mut min = max;

        for point in rest {
            total += point.predicted();
            if point.predicted() > max.price {
                max = PriceExtreme {
                    date: point.date(),
                    price: point.predicted(),
                };
            }
            if point.predicted() < min.price {
                min = PriceExtreme {
                    date: point.date(),
                    price: point.predicted(),
                };
            }
        }

        let average = (total / Decimal::from(points.len())).round_dp(2);
        max.price = max.price.round_dp(2);
        min.price = min.price.round_dp(2);
        Some(ForecastSummary { average, max, min })
    }
}
