//! Yahoo Finance 과거 시세 소스.
//!
//! 일봉 종가를 조회해 [`HistorySeries`]로 변환합니다.
//!
//! ```rust,ignore
//! use forecast_data::{HistoryPeriod, HistorySource, YahooHistorySource};
//!
//! let source = YahooHistorySource::new()?;
//! let series = source.fetch("GC=F", HistoryPeriod::years(2)).await?;
//! println!("{} points, last close {:?}", series.len(), series.last());
//! ```

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use forecast_core::{HistoryOrigin, HistorySeries, PricePoint};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use yahoo_finance_api as yahoo;

use crate::error::{HistoryError, Result};
use crate::source::{HistoryPeriod, HistorySource};

/// Yahoo Finance 기반 과거 데이터 소스.
pub struct YahooHistorySource {
    connector: yahoo::YahooConnector,
}

impl YahooHistorySource {
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| HistoryError::Connection(format!("{}", e)))?;

        Ok(Self { connector })
    }
}

/// 캔들 하나를 일별 가격 포인트로 변환합니다.
///
/// 타임스탬프나 종가가 유효하지 않으면 `None`.
fn candle_to_point(timestamp: i64, close: f64) -> Option<PricePoint> {
    let date = Utc.timestamp_opt(timestamp, 0).single()?.date_naive();
    if !close.is_finite() {
        return None;
    }
    let value = Decimal::from_f64_retain(close)?.round_dp(2);
    Some(PricePoint::new(date, value))
}

#[async_trait]
impl HistorySource for YahooHistorySource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, period: HistoryPeriod) -> Result<HistorySeries> {
        info!(symbol, years = period.as_years(), "Fetching price history");

        let response = self
            .connector
            .get_quote_range(symbol, "1d", &period.yahoo_range())
            .await
            .map_err(|e| HistoryError::Fetch {
                symbol: symbol.to_string(),
                message: format!("{}", e),
            })?;

        let quotes = response
            .quotes()
            .map_err(|e| HistoryError::Parse(format!("{}", e)))?;

        if quotes.is_empty() {
            return Err(HistoryError::Empty(symbol.to_string()));
        }

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| candle_to_point(q.timestamp as i64, q.close))
            .collect();
        let skipped = quotes.len() - points.len();
        if skipped > 0 {
            warn!(symbol, skipped, "Dropped invalid candles");
        }
        if points.is_empty() {
            return Err(HistoryError::Empty(symbol.to_string()));
        }

        let series = HistorySeries::from_unsorted(points, HistoryOrigin::Live);
        debug!(symbol, points = series.len(), "Price history received");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_to_point() {
        // 2025-01-02 00:00 UTC
        let point = candle_to_point(1_735_776_000, 2650.456).unwrap();
        assert_eq!(point.date.to_string(), "2025-01-02");
        assert_eq!(point.value, Decimal::new(265046, 2));
    }

    #[test]
    fn test_candle_to_point_skips_invalid() {
        assert!(candle_to_point(1_735_776_000, f64::NAN).is_none());
        assert!(candle_to_point(1_735_776_000, f64::INFINITY).is_none());
        assert!(candle_to_point(i64::MAX, 2650.0).is_none());
    }

    #[tokio::test]
    #[ignore] // 실제 API 호출 필요
    async fn test_fetch_gold_history_integration() {
        let source = YahooHistorySource::new().expect("connector");
        let series = source
            .fetch("GC=F", HistoryPeriod::years(1))
            .await
            .expect("fetch");

        assert!(series.len() > 100);
        assert_eq!(series.origin(), HistoryOrigin::Live);
        assert!(series.iter().all(|p| p.value > Decimal::ZERO));
    }
}
