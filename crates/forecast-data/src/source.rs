//! 과거 데이터 소스 트레잇.

use async_trait::async_trait;
use forecast_core::HistorySeries;

use crate::error::Result;

/// 조회 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPeriod {
    years: u32,
}

impl HistoryPeriod {
    pub fn years(years: u32) -> Self {
        Self {
            years: years.max(1),
        }
    }

    pub fn as_years(&self) -> u32 {
        self.years
    }

    /// Yahoo Finance `range` 파라미터 (예: "2y")
    pub fn yahoo_range(&self) -> String {
        format!("{}y", self.years)
    }
}

/// 외부 시세 피드.
///
/// 실패는 패닉이 아니라 `HistoryError`로 표현되어야 합니다.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// 로깅/진단용 소스 이름
    fn name(&self) -> &str;

    /// 심볼의 일별 종가 시계열을 조회합니다.
    async fn fetch(&self, symbol: &str, period: HistoryPeriod) -> Result<HistorySeries>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_range_string() {
        assert_eq!(HistoryPeriod::years(2).yahoo_range(), "2y");
        assert_eq!(HistoryPeriod::years(0).as_years(), 1);
    }
}
