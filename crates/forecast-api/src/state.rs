//! 애플리케이션 상태 관리.
//!
//! 모든 핸들러에서 공유되는 상태를 정의합니다.
//! 예측 캐시는 전역 변수가 아니라 이 상태를 통해 주입됩니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use forecast_core::AppConfig;

use crate::cache::ForecastCache;

/// 애플리케이션 공유 상태.
///
/// Axum 핸들러에서 `State<Arc<AppState>>`로 접근합니다.
#[derive(Clone)]
pub struct AppState {
    /// 예측 스냅샷 캐시
    pub cache: ForecastCache,

    /// 애플리케이션 설정
    pub config: Arc<AppConfig>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(config: AppConfig, cache: ForecastCache) -> Self {
        Self {
            cache,
            config: Arc::new(config),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 예측 대상 심볼
    pub fn symbol(&self) -> &str {
        &self.config.forecast.symbol
    }

    /// 서버 업타임 (초)
    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}

/// 테스트용 상태 생성.
///
/// 외부 피드는 항상 실패하므로 합성 데이터로 예측합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use forecast_data::{HistoryError, HistoryPeriod, HistorySource};
    use forecast_model::SeasonalTrendEngine;

    struct UnavailableSource;

    #[async_trait::async_trait]
    impl HistorySource for UnavailableSource {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn fetch(
            &self,
            symbol: &str,
            _period: HistoryPeriod,
        ) -> forecast_data::Result<forecast_core::HistorySeries> {
            Err(HistoryError::Connection(format!("offline ({})", symbol)))
        }
    }

    let config = AppConfig::default();
    let cache = ForecastCache::new(
        crate::cache::CacheSettings::from_config(&config),
        Arc::new(UnavailableSource),
        Arc::new(SeasonalTrendEngine::default()),
    );
    AppState::new(config, cache)
}
