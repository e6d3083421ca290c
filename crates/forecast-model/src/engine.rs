//! 예측 엔진 트레잇.

use forecast_core::{ForecastPoint, HistorySeries};

use crate::error::EngineResult;

/// 과거 시계열로 학습해 미래 곡선을 생성하는 엔진.
///
/// 동기 CPU 작업입니다. 비동기 컨텍스트에서는 `spawn_blocking`으로 호출해야 합니다.
/// 반환되는 포인트는 시계열 마지막 날짜 다음 날부터 `horizon_days`일 동안의
/// 연속 달력일이며 날짜 오름차순입니다.
pub trait ForecastEngine: Send + Sync {
    /// 로깅용 엔진 이름
    fn name(&self) -> &str;

    fn train_and_predict(
        &self,
        series: &HistorySeries,
        horizon_days: u32,
    ) -> EngineResult<Vec<ForecastPoint>>;
}
