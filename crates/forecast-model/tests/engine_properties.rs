//! 예측 엔진 속성 테스트
//!
//! 임의의 양의 가격 시계열에 대해 곡선의 날짜/구간 불변식을 검증합니다.

use chrono::{Duration, NaiveDate};
use forecast_core::{HistoryOrigin, HistorySeries, PricePoint};
use forecast_model::{EngineError, ForecastEngine, SeasonalTrendEngine};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn build_series(cents: &[i64]) -> HistorySeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let points = cents
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::new(start + Duration::days(i as i64), Decimal::new(*c, 2)))
        .collect();
    HistorySeries::new(points, HistoryOrigin::Live).unwrap()
}

proptest! {
    #[test]
    fn curve_is_contiguous_and_bounded(
        cents in prop::collection::vec(150_000i64..250_000, 14..200),
        horizon in 1u32..120,
    ) {
        let series = build_series(&cents);
        let engine = SeasonalTrendEngine::default();

        match engine.train_and_predict(&series, horizon) {
            Ok(curve) => {
                let last = series.last().unwrap().date;
                prop_assert_eq!(curve.len(), horizon as usize);
                prop_assert_eq!(curve[0].date(), last + Duration::days(1));
                prop_assert!(curve.windows(2).all(|w| w[1].date() - w[0].date() == Duration::days(1)));
                prop_assert!(curve.iter().all(|p| p.lower_bound() <= p.predicted() && p.predicted() <= p.upper_bound()));
            }
            Err(EngineError::DegenerateSeries(_)) => {
                prop_assert!(cents.iter().all(|c| *c == cents[0]));
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
