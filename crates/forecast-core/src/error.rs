//! 도메인 에러 타입.
//!
//! 시계열/예측 포인트 생성 시의 불변식 위반과 날짜 범위 입력 오류를 정의합니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// 도메인 불변식 위반 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 시계열 날짜가 오름차순이 아님
    #[error("Series not sorted: {next} follows {previous}")]
    UnsortedSeries { previous: NaiveDate, next: NaiveDate },

    /// 같은 날짜가 두 번 등장
    #[error("Duplicate date in series: {0}")]
    DuplicateDate(NaiveDate),

    /// lower_bound <= predicted <= upper_bound 위반
    #[error("Interval bounds violated on {date}: expected {lower} <= {predicted} <= {upper}")]
    BoundsViolation {
        date: NaiveDate,
        lower: Decimal,
        predicted: Decimal,
        upper: Decimal,
    },
}

/// 날짜 범위 입력 에러.
///
/// 호출자 입력 오류이며 재시도 대상이 아닙니다. HTTP 계층에서는 400으로 변환됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// 필수 파라미터 누락
    #[error("Missing {0} parameter")]
    Missing(&'static str),

    /// YYYY-MM-DD 형식이 아님
    #[error("Invalid date format for {field}: '{value}'. Use YYYY-MM-DD")]
    InvalidFormat { field: &'static str, value: String },

    /// 시작일이 종료일보다 늦음
    #[error("Start date {start} must not be after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// 도메인 작업을 위한 Result 타입.
pub type DomainResult<T> = Result<T, DomainError>;
