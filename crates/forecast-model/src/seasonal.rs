//! 선형 추세 + 요일 계절성 예측 엔진.
//!
//! 1. Holt 이중 지수 평활로 레벨과 추세를 추정합니다.
//! 2. 관측 간격이 달력일과 다를 수 있으므로 (주말 휴장) 추세를 달력일 기준으로 환산합니다.
//! 3. 1단계 예측 잔차의 요일별 평균을 계절 성분으로 사용합니다.
//! 4. 계절 성분을 제거한 잔차의 표준편차로 `±z·σ·√h` 신뢰 구간을 만듭니다.

use chrono::{Datelike, Duration, NaiveDate};
use forecast_core::{validate_finite, validation_message, ForecastPoint, HistorySeries};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::engine::ForecastEngine;
use crate::error::{EngineError, EngineResult};

/// 엔진 설정.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeasonalTrendConfig {
    /// 레벨 평활 계수 (0, 1)
    #[validate(
        range(exclusive_min = 0.0, exclusive_max = 1.0, message = "alpha must be in (0, 1)"),
        custom(function = "validate_finite")
    )]
    pub alpha: f64,
    /// 추세 평활 계수 (0, 1)
    #[validate(
        range(exclusive_min = 0.0, exclusive_max = 1.0, message = "beta must be in (0, 1)"),
        custom(function = "validate_finite")
    )]
    pub beta: f64,
    /// 신뢰 구간 폭 (0, 1). 0.8이면 80% 구간
    #[validate(
        range(exclusive_min = 0.0, exclusive_max = 1.0, message = "interval_width must be in (0, 1)"),
        custom(function = "validate_finite")
    )]
    pub interval_width: f64,
    /// 학습에 필요한 최소 포인트 수 (요일 두 주기)
    #[validate(range(min = 2, message = "min_points must be at least 2"))]
    pub min_points: usize,
}

impl Default for SeasonalTrendConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.05,
            interval_width: 0.8,
            min_points: 14,
        }
    }
}

impl SeasonalTrendConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    fn check(&self) -> EngineResult<()> {
        self.validate()
            .map_err(|errors| EngineError::InvalidParameter(validation_message(&errors)))
    }
}

/// 학습된 모델 상태.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// 마지막 관측일
    pub last_date: NaiveDate,
    /// 마지막 관측 시점의 레벨
    pub level: f64,
    /// 달력일 1일당 추세
    pub trend_per_day: f64,
    /// 월요일(0)~일요일(6) 계절 성분
    pub seasonal: [f64; 7],
    /// 계절 성분 제거 후 잔차 표준편차
    pub sigma: f64,
}

impl FittedModel {
    /// 마지막 관측일 다음 날부터 `horizon_days`일 동안의 (날짜, 예측, 밴드 반폭).
    pub fn project(&self, horizon_days: u32, z: f64) -> Vec<(NaiveDate, f64, f64)> {
        (1..=i64::from(horizon_days))
            .map(|k| {
                let date = self.last_date + Duration::days(k);
                let weekday = date.weekday().num_days_from_monday() as usize;
                let predicted =
                    self.level + self.trend_per_day * k as f64 + self.seasonal[weekday];
                let half_width = z * self.sigma * (k as f64).sqrt();
                (date, predicted, half_width)
            })
            .collect()
    }
}

/// 선형 추세 + 요일 계절성 엔진.
#[derive(Debug, Clone, Default)]
pub struct SeasonalTrendEngine {
    config: SeasonalTrendConfig,
}

impl SeasonalTrendEngine {
    pub fn new(config: SeasonalTrendConfig) -> EngineResult<Self> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SeasonalTrendConfig {
        &self.config
    }

    /// 시계열을 학습합니다.
    pub fn fit(&self, series: &HistorySeries) -> EngineResult<FittedModel> {
        let n = series.len();
        if n < self.config.min_points {
            return Err(EngineError::InsufficientData {
                required: self.config.min_points,
                actual: n,
            });
        }

        let mut dates = Vec::with_capacity(n);
        let mut values = Vec::with_capacity(n);
        for point in series.iter() {
            let value = point
                .value
                .to_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    EngineError::Numerical(format!("unrepresentable price on {}", point.date))
                })?;
            dates.push(point.date);
            values.push(value);
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        if max - min <= f64::EPSILON {
            return Err(EngineError::DegenerateSeries(format!(
                "all {} observations equal {}",
                n, min
            )));
        }

        // Holt 평활 + 1단계 예측 잔차
        let (alpha, beta) = (self.config.alpha, self.config.beta);
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut residuals = Vec::with_capacity(n - 1);
        for &y in &values[1..] {
            let fitted = level + trend;
            residuals.push(y - fitted);

            let prev_level = level;
            level = alpha * y + (1.0 - alpha) * (level + trend);
            trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        }

        let first_date = dates[0];
        let last_date = dates[n - 1];
        let span_days = (last_date - first_date).num_days() as f64;
        let trend_per_day = if span_days > 0.0 {
            trend * (n - 1) as f64 / span_days
        } else {
            trend
        };

        // 요일별 잔차 평균 (존재하는 요일 기준으로 중심화)
        let mut sums = [0.0_f64; 7];
        let mut counts = [0_usize; 7];
        for (date, r) in dates[1..].iter().zip(&residuals) {
            let wd = date.weekday().num_days_from_monday() as usize;
            sums[wd] += r;
            counts[wd] += 1;
        }
        let mut seasonal = [0.0_f64; 7];
        let present: Vec<usize> = (0..7).filter(|wd| counts[*wd] > 0).collect();
        for wd in &present {
            seasonal[*wd] = sums[*wd] / counts[*wd] as f64;
        }
        let center = present.iter().map(|wd| seasonal[*wd]).sum::<f64>() / present.len() as f64;
        for wd in &present {
            seasonal[*wd] -= center;
        }

        let adjusted: Vec<f64> = dates[1..]
            .iter()
            .zip(&residuals)
            .map(|(date, r)| r - seasonal[date.weekday().num_days_from_monday() as usize])
            .collect();
        let mean = adjusted.iter().sum::<f64>() / adjusted.len() as f64;
        let variance = adjusted.iter().map(|e| (e - mean).powi(2)).sum::<f64>()
            / (adjusted.len().max(2) - 1) as f64;
        let sigma = variance.sqrt();

        if !level.is_finite() || !trend_per_day.is_finite() || !sigma.is_finite() {
            return Err(EngineError::Numerical(
                "non-finite model state after smoothing".to_string(),
            ));
        }

        debug!(
            points = n,
            level,
            trend_per_day,
            sigma,
            "Seasonal trend model fitted"
        );

        Ok(FittedModel {
            last_date,
            level,
            trend_per_day,
            seasonal,
            sigma,
        })
    }
}

impl ForecastEngine for SeasonalTrendEngine {
    fn name(&self) -> &str {
        "seasonal_trend"
    }

    fn train_and_predict(
        &self,
        series: &HistorySeries,
        horizon_days: u32,
    ) -> EngineResult<Vec<ForecastPoint>> {
        if horizon_days == 0 {
            return Err(EngineError::InvalidParameter(
                "horizon_days must be positive".to_string(),
            ));
        }

        let model = self.fit(series)?;
        let z = z_score(self.config.interval_width);

        model
            .project(horizon_days, z)
            .into_iter()
            .map(|(date, predicted, half_width)| {
                let point = ForecastPoint::new(
                    date,
                    to_price(predicted)?,
                    to_price(predicted - half_width)?,
                    to_price(predicted + half_width)?,
                );
                point.map_err(|e| EngineError::Numerical(e.to_string()))
            })
            .collect()
    }
}

fn to_price(value: f64) -> EngineResult<Decimal> {
    if !value.is_finite() {
        return Err(EngineError::Numerical(format!("non-finite value {}", value)));
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| EngineError::Numerical(format!("value out of range {}", value)))
}

/// 양측 구간 폭에 대한 표준 정규 분위수.
///
/// Abramowitz & Stegun 26.2.23 근사 (오차 < 4.5e-4).
pub fn z_score(interval_width: f64) -> f64 {
    let p = (1.0 + interval_width.clamp(0.0, 0.999_999)) / 2.0;
    let t = (-2.0 * (1.0 - p).ln()).sqrt();
    let numerator = 2.515_517 + 0.802_853 * t + 0.010_328 * t * t;
    let denominator = 1.0 + 1.432_788 * t + 0.189_269 * t * t + 0.001_308 * t * t * t;
    (t - numerator / denominator).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::{HistoryOrigin, PricePoint};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series_from(points: Vec<(NaiveDate, i64)>) -> HistorySeries {
        let points = points
            .into_iter()
            .map(|(d, v)| PricePoint::new(d, Decimal::from(v)))
            .collect();
        HistorySeries::new(points, HistoryOrigin::Live).unwrap()
    }

    /// 1800 + 5i + 20(i mod 7) 형태의 일별 시계열
    fn sawtooth(n: i64, end: NaiveDate) -> HistorySeries {
        series_from(
            (0..n)
                .map(|i| (end - Duration::days(n - 1 - i), 1800 + 5 * i + 20 * (i % 7)))
                .collect(),
        )
    }

    #[test]
    fn test_z_score() {
        assert!((z_score(0.8) - 1.2816).abs() < 1e-3);
        assert!((z_score(0.95) - 1.96).abs() < 1e-3);
        assert!(z_score(0.5) < z_score(0.8));
    }

    #[test]
    fn test_config_validation() {
        assert!(SeasonalTrendEngine::new(SeasonalTrendConfig::default()).is_ok());

        let err = SeasonalTrendEngine::new(SeasonalTrendConfig::default().with_alpha(1.5));
        assert!(matches!(err, Err(EngineError::InvalidParameter(_))));

        let err = SeasonalTrendEngine::new(SeasonalTrendConfig::default().with_min_points(1));
        assert_eq!(
            err.unwrap_err(),
            EngineError::InvalidParameter("min_points must be at least 2".to_string())
        );

        let err = SeasonalTrendEngine::new(SeasonalTrendConfig::default().with_beta(f64::NAN));
        assert!(matches!(err, Err(EngineError::InvalidParameter(_))));

        let err = SeasonalTrendEngine::new(SeasonalTrendConfig::default().with_interval_width(0.0));
        assert_eq!(
            err.unwrap_err(),
            EngineError::InvalidParameter("interval_width must be in (0, 1)".to_string())
        );
    }

    #[test]
    fn test_insufficient_data() {
        let engine = SeasonalTrendEngine::default();
        let series = sawtooth(5, day(2025, 1, 10));

        let err = engine.train_and_predict(&series, 90).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientData {
                required: 14,
                actual: 5
            }
        );
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let engine = SeasonalTrendEngine::default();
        let series = sawtooth(60, day(2025, 1, 10));

        let err = engine.train_and_predict(&series, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter(_)));
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        let engine = SeasonalTrendEngine::default();
        let end = day(2025, 1, 31);
        let series = series_from((0..30).map(|i| (end - Duration::days(29 - i), 2000)).collect());

        let err = engine.train_and_predict(&series, 10).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateSeries(_)));
    }

    #[test]
    fn test_forecast_shape_on_sawtooth() {
        let engine = SeasonalTrendEngine::default();
        let end = day(2025, 3, 1);
        let series = sawtooth(500, end);

        let curve = engine.train_and_predict(&series, 90).unwrap();

        assert_eq!(curve.len(), 90);
        assert_eq!(curve[0].date(), end + Duration::days(1));
        assert_eq!(curve[89].date(), end + Duration::days(90));
        assert!(curve.windows(2).all(|w| w[1].date() - w[0].date() == Duration::days(1)));
        assert!(curve
            .iter()
            .all(|p| p.lower_bound() <= p.predicted() && p.predicted() <= p.upper_bound()));
        assert!(curve.iter().all(|p| p.predicted().scale() <= 2));

        // 상승 추세 (하루 약 5)
        let model = engine.fit(&series).unwrap();
        assert!(model.trend_per_day > 2.0 && model.trend_per_day < 8.0);
        assert!(curve[89].predicted() > curve[0].predicted() + Decimal::from(100));

        // 구간은 시간이 지날수록 넓어짐
        let width = |p: &ForecastPoint| p.upper_bound() - p.lower_bound();
        assert!(width(&curve[89]) > width(&curve[0]));
    }

    #[test]
    fn test_trend_converted_to_calendar_days() {
        // 평일만 존재하는 완전 선형 시계열 (거래일당 +2)
        let start = day(2024, 1, 1);
        let weekdays: Vec<NaiveDate> = (0..200)
            .map(|i| start + Duration::days(i))
            .filter(|d| d.weekday().num_days_from_monday() < 5)
            .take(100)
            .collect();
        let n = weekdays.len();
        let span = (weekdays[n - 1] - weekdays[0]).num_days() as f64;
        let series = series_from(
            weekdays
                .iter()
                .enumerate()
                .map(|(i, d)| (*d, 1000 + 2 * i as i64))
                .collect(),
        );

        let engine = SeasonalTrendEngine::default();
        let model = engine.fit(&series).unwrap();
        let expected = 2.0 * (n - 1) as f64 / span;
        assert!((model.trend_per_day - expected).abs() < 1e-6);
        assert!(model.sigma < 1e-6);

        let curve = engine.train_and_predict(&series, 70).unwrap();
        let growth = (curve[69].predicted() - curve[0].predicted()).to_f64().unwrap();
        assert!((growth - expected * 69.0).abs() < 0.05);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let engine = SeasonalTrendEngine::default();
        let series = sawtooth(120, day(2025, 6, 30));
        assert_eq!(
            engine.train_and_predict(&series, 30).unwrap(),
            engine.train_and_predict(&series, 30).unwrap()
        );
    }
}
