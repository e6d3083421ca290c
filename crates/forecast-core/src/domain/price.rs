//! 과거 가격 시계열.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// 하루 단위 가격.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 거래일
    pub date: NaiveDate,
    /// 종가
    pub value: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// 시계열 데이터의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrigin {
    /// 외부 시세 피드에서 받은 실제 데이터
    #[default]
    Live,
    /// 피드 실패 시 생성된 합성 데이터
    Fallback,
}

impl std::fmt::Display for HistoryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryOrigin::Live => write!(f, "live"),
            HistoryOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// 날짜 오름차순, 중복 없는 가격 시계열.
///
/// 생성자를 통해서만 만들어지므로 정렬/중복 불변식이 항상 유지됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySeries {
    points: Vec<PricePoint>,
    origin: HistoryOrigin,
}

impl HistorySeries {
    /// 이미 정렬된 포인트로 시계열을 생성합니다.
    ///
    /// # Errors
    ///
    /// 날짜가 역순이면 `UnsortedSeries`, 같은 날짜가 반복되면 `DuplicateDate`.
    pub fn new(points: Vec<PricePoint>, origin: HistoryOrigin) -> DomainResult<Self> {
        for pair in points.windows(2) {
            let (previous, next) = (pair[0].date, pair[1].date);
            if previous == next {
                return Err(DomainError::DuplicateDate(next));
            }
            if previous > next {
                return Err(DomainError::UnsortedSeries { previous, next });
            }
        }
        Ok(Self { points, origin })
    }

    /// 임의 순서의 포인트를 정렬하고, 같은 날짜는 마지막 값만 남깁니다.
    pub fn from_unsorted(mut points: Vec<PricePoint>, origin: HistoryOrigin) -> Self {
        // 안정 정렬이므로 같은 날짜 내에서는 입력 순서가 유지됨
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            points: deduped,
            origin,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn origin(&self) -> HistoryOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_new_accepts_ascending_series() {
        let series = HistorySeries::new(
            vec![
                PricePoint::new(day(1), dec!(2000)),
                PricePoint::new(day(2), dec!(2010)),
                PricePoint::new(day(4), dec!(2005)),
            ],
            HistoryOrigin::Live,
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().date, day(4));
        assert_eq!(series.origin(), HistoryOrigin::Live);
    }

    #[test]
    fn test_new_rejects_duplicates_and_unsorted() {
        let duplicate = HistorySeries::new(
            vec![
                PricePoint::new(day(1), dec!(1)),
                PricePoint::new(day(1), dec!(2)),
            ],
            HistoryOrigin::Live,
        );
        assert_eq!(duplicate, Err(DomainError::DuplicateDate(day(1))));

        let unsorted = HistorySeries::new(
            vec![
                PricePoint::new(day(3), dec!(1)),
                PricePoint::new(day(2), dec!(2)),
            ],
            HistoryOrigin::Live,
        );
        assert!(matches!(unsorted, Err(DomainError::UnsortedSeries { .. })));
    }

    #[test]
    fn test_from_unsorted_sorts_and_keeps_last_duplicate() {
        let series = HistorySeries::from_unsorted(
            vec![
                PricePoint::new(day(5), dec!(5)),
                PricePoint::new(day(2), dec!(2)),
                PricePoint::new(day(5), dec!(55)),
                PricePoint::new(day(3), dec!(3)),
            ],
            HistoryOrigin::Fallback,
        );

        let dates: Vec<_> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(2), day(3), day(5)]);
        assert_eq!(series.last().unwrap().value, dec!(55));
        assert_eq!(series.origin(), HistoryOrigin::Fallback);
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(HistoryOrigin::Live.to_string(), "live");
        assert_eq!(HistoryOrigin::Fallback.to_string(), "fallback");
    }
}
