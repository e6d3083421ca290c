//! 예측 스냅샷 캐시.
//!
//! 하나의 [`ForecastSnapshot`]을 보관하고 만료 시 갱신합니다.
//!
//! # 갱신 규칙
//!
//! - 스냅샷이 유효하면 그대로 반환합니다.
//! - 만료된 스냅샷이 있으면 갱신 잠금을 `try_lock`으로 시도합니다.
//!   잠금을 얻지 못한 요청은 기다리지 않고 기존 스냅샷을 받습니다.
//! - 스냅샷이 한 번도 계산되지 않았다면 첫 갱신이 끝날 때까지 대기합니다.
//!   기다리던 갱신이 실패하면 대기자들은 다시 계산하지 않고 같은 실패를 받습니다.
//! - 갱신은 잠금 가드를 소유한 별도 태스크에서 실행되므로 요청이 취소되어도 중단되지 않습니다.
//! - 엔진 실패 시 기존 스냅샷을 유지하고, 스냅샷이 없으면 [`CacheError::ColdStart`]를 반환합니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, warn, Instrument};

use forecast_core::{AppConfig, ForecastSnapshot, HistoryOrigin, HistorySeries};
use forecast_data::{FallbackGenerator, HistoryError, HistoryPeriod, HistorySource};
use forecast_model::{EngineError, ForecastEngine};

use crate::metrics::{
    record_cache_lookup, record_history_fallback, record_refresh, set_snapshot_points,
};

// ==================== 설정 ====================

/// 캐시 동작 설정.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// 시세 심볼
    pub symbol: String,
    /// 과거 데이터 조회 기간
    pub history_period: HistoryPeriod,
    /// 예측 기간 (일)
    pub horizon_days: u32,
    /// 실제 데이터로 인정할 최소 포인트 수
    pub min_history_points: usize,
    /// 합성 데이터 포인트 수
    pub fallback_points: usize,
    /// 스냅샷 유효 시간
    pub cache_duration: Duration,
    /// 갱신 실패 후 재시도 대기 시간
    pub failure_backoff: Duration,
    /// 연속 실패 허용 횟수 (None이면 무기한 만료 스냅샷 제공)
    pub max_consecutive_failures: Option<u32>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl CacheSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            symbol: config.forecast.symbol.clone(),
            history_period: HistoryPeriod::years(config.forecast.history_years),
            horizon_days: config.forecast.horizon_days,
            min_history_points: config.forecast.min_history_points,
            fallback_points: config.forecast.fallback_points,
            cache_duration: config.cache.duration(),
            failure_backoff: config.cache.failure_backoff(),
            max_consecutive_failures: config.cache.max_consecutive_failures,
        }
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    pub fn with_max_consecutive_failures(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_failures = limit;
        self
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }
}

// ==================== 에러 ====================

/// 갱신 사이클 실패 원인.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("Forecast engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Forecast contains no future dates")]
    NoFuturePoints,

    #[error("Refresh task aborted: {0}")]
    TaskAborted(String),
}

/// 캐시 조회 실패.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// 첫 계산 실패 (제공할 스냅샷 없음)
    #[error("Initial forecast computation failed: {0}")]
    ColdStart(RefreshError),

    /// 연속 실패 한도 초과로 만료 스냅샷 제공 중단
    #[error("Forecast refresh failed {failures} consecutive times")]
    StaleLimitExceeded {
        failures: u32,
        last_error: Option<String>,
    },
}

// ==================== 상태 보고 ====================

/// 캐시 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// 스냅샷 없음, 갱신 시도 없음
    Empty,
    /// 갱신 진행 중
    Refreshing,
    /// 스냅샷 제공 가능
    Ready,
    /// 스냅샷 없이 첫 계산 실패
    Failed,
}

/// `/health` 등에서 사용하는 캐시 진단 정보.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub state: CacheState,
    pub computed_at: Option<DateTime<Utc>>,
    pub age_secs: Option<i64>,
    pub stale: bool,
    pub points: usize,
    pub origin: Option<HistoryOrigin>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct RefreshStats {
    /// 끝난 갱신 시도 수 (성공과 실패 모두)
    attempts: u64,
    consecutive_failures: u32,
    last_error: Option<RefreshError>,
    last_failure_at: Option<DateTime<Utc>>,
}

impl RefreshStats {
    fn record_success(&mut self) {
        self.attempts += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_failure_at = None;
    }

    fn record_failure(&mut self, now: DateTime<Utc>, error: &RefreshError) {
        self.attempts += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.clone());
        self.last_failure_at = Some(now);
    }

    fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }

    /// `since` 이후 끝난 시도가 있고 마지막 시도가 실패했다면 그 에러.
    fn failed_since(&self, since: u64) -> Option<RefreshError> {
        if self.attempts > since {
            self.last_error.clone()
        } else {
            None
        }
    }
}

// ==================== 캐시 ====================

struct CacheInner {
    settings: CacheSettings,
    source: Arc<dyn HistorySource>,
    engine: Arc<dyn ForecastEngine>,
    fallback: FallbackGenerator,
    snapshot: RwLock<Option<Arc<ForecastSnapshot>>>,
    stats: RwLock<RefreshStats>,
    refresh_lock: Arc<Mutex<()>>,
    refreshing: AtomicBool,
}

/// 갱신 태스크가 소유하는 가드. 해제 시 진행 중 플래그를 내립니다.
struct RefreshGuard {
    inner: Arc<CacheInner>,
    _lock: OwnedMutexGuard<()>,
}

impl RefreshGuard {
    fn new(inner: Arc<CacheInner>, lock: OwnedMutexGuard<()>) -> Self {
        inner.refreshing.store(true, Ordering::SeqCst);
        Self { inner, _lock: lock }
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.inner.refreshing.store(false, Ordering::SeqCst);
    }
}

/// 예측 스냅샷 캐시.
///
/// 복제 비용이 낮으며 모든 복제본이 같은 상태를 공유합니다.
#[derive(Clone)]
pub struct ForecastCache {
    inner: Arc<CacheInner>,
}

impl ForecastCache {
    pub fn new(
        settings: CacheSettings,
        source: Arc<dyn HistorySource>,
        engine: Arc<dyn ForecastEngine>,
    ) -> Self {
        let fallback = FallbackGenerator::new(settings.fallback_points, settings.min_history_points);
        Self {
            inner: Arc::new(CacheInner {
                settings,
                source,
                engine,
                fallback,
                snapshot: RwLock::new(None),
                stats: RwLock::new(RefreshStats::default()),
                refresh_lock: Arc::new(Mutex::new(())),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    /// 현재 예측 스냅샷을 반환합니다. 필요하면 갱신합니다.
    pub async fn get_current(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Arc<ForecastSnapshot>, CacheError> {
        let current = self.inner.snapshot.read().await.clone();

        match current {
            Some(snapshot) if !self.is_stale(&snapshot, now) => {
                record_cache_lookup("hit");
                Ok(snapshot)
            }
            Some(stale) => self.refresh_stale(stale, now).await,
            None => self.refresh_cold(now).await,
        }
    }

    /// 갱신 없이 현재 스냅샷을 반환합니다.
    pub async fn peek(&self) -> Option<Arc<ForecastSnapshot>> {
        self.inner.snapshot.read().await.clone()
    }

    /// 서버 시작 시 첫 스냅샷을 계산합니다.
    pub async fn warm_up(&self, now: DateTime<Utc>) -> Result<Arc<ForecastSnapshot>, CacheError> {
        info!(symbol = %self.inner.settings.symbol, "Warming up forecast cache");
        self.get_current(now).await
    }

    /// 캐시 진단 정보.
    pub async fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        let snapshot = self.peek().await;
        let stats = self.inner.stats.read().await.clone();
        let refreshing = self.inner.refreshing.load(Ordering::SeqCst);

        let state = match (&snapshot, refreshing) {
            (_, true) => CacheState::Refreshing,
            (Some(_), false) => CacheState::Ready,
            (None, false) if stats.consecutive_failures > 0 => CacheState::Failed,
            (None, false) => CacheState::Empty,
        };

        CacheStatus {
            state,
            computed_at: snapshot.as_ref().map(|s| s.computed_at()),
            age_secs: snapshot.as_ref().map(|s| s.age(now).num_seconds()),
            stale: snapshot.as_ref().is_some_and(|s| self.is_stale(s, now)),
            points: snapshot.as_ref().map_or(0, |s| s.len()),
            origin: snapshot.as_ref().map(|s| s.origin()),
            consecutive_failures: stats.consecutive_failures,
            last_error: stats.last_error_message(),
        }
    }

    fn is_stale(&self, snapshot: &ForecastSnapshot, now: DateTime<Utc>) -> bool {
        snapshot.is_stale(now, self.inner.settings.cache_duration)
    }

    async fn fresh_snapshot(&self, now: DateTime<Utc>) -> Option<Arc<ForecastSnapshot>> {
        self.peek().await.filter(|s| !self.is_stale(s, now))
    }

    /// 만료 스냅샷 경로. 잠금 경합 시 기다리지 않습니다.
    async fn refresh_stale(
        &self,
        stale: Arc<ForecastSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<Arc<ForecastSnapshot>, CacheError> {
        if self.in_backoff(now).await {
            debug!("Refresh suppressed by failure backoff, serving stale snapshot");
            return self.serve_stale(stale).await;
        }

        let lock = match Arc::clone(&self.inner.refresh_lock).try_lock_owned() {
            Ok(lock) => lock,
            Err(_) => {
                debug!("Refresh already in progress, serving stale snapshot");
                return self.serve_stale(stale).await;
            }
        };

        // 읽기와 잠금 사이에 다른 갱신이 끝났을 수 있음
        if let Some(current) = self.fresh_snapshot(now).await {
            record_cache_lookup("hit");
            return Ok(current);
        }

        match self.spawn_refresh(lock, now).await {
            Ok(snapshot) => {
                record_cache_lookup("refreshed");
                Ok(snapshot)
            }
            Err(_) => self.serve_stale(stale).await,
        }
    }

    /// 스냅샷이 없는 경로. 진행 중인 갱신을 기다립니다.
    ///
    /// 기다리는 동안 끝난 시도가 실패했다면 재계산하지 않고 그 결과를 공유합니다.
    async fn refresh_cold(&self, now: DateTime<Utc>) -> Result<Arc<ForecastSnapshot>, CacheError> {
        let seen_attempts = self.inner.stats.read().await.attempts;
        let lock = Arc::clone(&self.inner.refresh_lock).lock_owned().await;
        let failed_while_waiting = self.inner.stats.read().await.failed_since(seen_attempts);

        match (self.peek().await, failed_while_waiting) {
            (Some(current), _) if !self.is_stale(&current, now) => {
                record_cache_lookup("hit");
                Ok(current)
            }
            (Some(stale), Some(_)) => {
                drop(lock);
                self.serve_stale(stale).await
            }
            (None, Some(err)) => {
                drop(lock);
                debug!(error = %err, "Initial refresh failed while waiting, sharing its error");
                record_cache_lookup("cold_failed");
                Err(CacheError::ColdStart(err))
            }
            (Some(stale), None) => match self.spawn_refresh(lock, now).await {
                Ok(snapshot) => {
                    record_cache_lookup("refreshed");
                    Ok(snapshot)
                }
                Err(_) => self.serve_stale(stale).await,
            },
            (None, None) => {
                let snapshot = self
                    .spawn_refresh(lock, now)
                    .await
                    .map_err(CacheError::ColdStart)?;
                record_cache_lookup("refreshed");
                Ok(snapshot)
            }
        }
    }

    async fn in_backoff(&self, now: DateTime<Utc>) -> bool {
        let stats = self.inner.stats.read().await;
        match stats.last_failure_at {
            Some(failed_at) if stats.consecutive_failures > 0 => {
                now - failed_at < self.inner.settings.failure_backoff
            }
            _ => false,
        }
    }

    async fn serve_stale(
        &self,
        stale: Arc<ForecastSnapshot>,
    ) -> Result<Arc<ForecastSnapshot>, CacheError> {
        let stats = self.inner.stats.read().await;
        if let Some(limit) = self.inner.settings.max_consecutive_failures {
            if stats.consecutive_failures >= limit {
                record_cache_lookup("stale_rejected");
                return Err(CacheError::StaleLimitExceeded {
                    failures: stats.consecutive_failures,
                    last_error: stats.last_error_message(),
                });
            }
        }
        record_cache_lookup("stale");
        Ok(stale)
    }

    /// 잠금 가드를 태스크로 넘겨 갱신을 실행하고 결과를 기다립니다.
    async fn spawn_refresh(
        &self,
        lock: OwnedMutexGuard<()>,
        now: DateTime<Utc>,
    ) -> Result<Arc<ForecastSnapshot>, RefreshError> {
        let guard = RefreshGuard::new(Arc::clone(&self.inner), lock);
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let result = inner.refresh(now).await;
            drop(guard);
            result
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let err = RefreshError::TaskAborted(e.to_string());
                self.inner.stats.write().await.record_failure(now, &err);
                error!(error = %err, "Forecast refresh task failed");
                Err(err)
            }
        }
    }
}

impl CacheInner {
    /// 한 번의 갱신 사이클. 성공 시 스냅샷을 교체합니다.
    async fn refresh(&self, now: DateTime<Utc>) -> Result<Arc<ForecastSnapshot>, RefreshError> {
        let span = forecast_core::refresh_span!(self.settings.symbol, now);

        async move {
            let started = Instant::now();
            let result = self.compute(now).await;
            let elapsed = started.elapsed();

            match result {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    *self.snapshot.write().await = Some(Arc::clone(&snapshot));
                    self.stats.write().await.record_success();

                    record_refresh("success", elapsed.as_secs_f64());
                    set_snapshot_points(snapshot.len());
                    info!(
                        origin = %snapshot.origin(),
                        points = snapshot.len(),
                        history_points = snapshot.history_len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Forecast refreshed"
                    );
                    Ok(snapshot)
                }
                Err(err) => {
                    let mut stats = self.stats.write().await;
                    stats.record_failure(now, &err);

                    record_refresh("failure", elapsed.as_secs_f64());
                    error!(
                        error = %err,
                        consecutive_failures = stats.consecutive_failures,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Forecast refresh failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn compute(&self, now: DateTime<Utc>) -> Result<ForecastSnapshot, RefreshError> {
        let series = self.load_history(now).await;
        let origin = series.origin();
        let history_len = series.len();

        let engine = Arc::clone(&self.engine);
        let horizon_days = self.settings.horizon_days;
        let curve = tokio::task::spawn_blocking(move || {
            engine.train_and_predict(&series, horizon_days)
        })
        .await
        .map_err(|e| RefreshError::TaskAborted(e.to_string()))??;

        let snapshot = ForecastSnapshot::from_curve(curve, now, origin, history_len);
        if snapshot.is_empty() {
            return Err(RefreshError::NoFuturePoints);
        }
        Ok(snapshot)
    }

    /// 과거 데이터 조회. 실패하거나 부족하면 합성 데이터를 사용합니다.
    async fn load_history(&self, now: DateTime<Utc>) -> HistorySeries {
        let symbol = &self.settings.symbol;
        let required = self.settings.min_history_points;

        let error = match self.source.fetch(symbol, self.settings.history_period).await {
            Ok(series) if series.len() >= required => {
                debug!(
                    source = self.source.name(),
                    points = series.len(),
                    "Using live price history"
                );
                return series;
            }
            Ok(series) => HistoryError::Insufficient {
                required,
                actual: series.len(),
            },
            Err(e) => e,
        };

        warn!(
            source = self.source.name(),
            error = %error,
            transport = error.is_transport(),
            fallback_points = self.fallback.points(),
            "Price history unavailable, using fallback data"
        );
        record_history_fallback();
        self.fallback.generate(now.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use forecast_core::{ForecastPoint, PricePoint};
    use forecast_model::EngineResult;
    use rust_decimal::Decimal;
    use std::sync::atomic::AtomicUsize;

    struct ShortSource;

    #[async_trait]
    impl HistorySource for ShortSource {
        fn name(&self) -> &str {
            "short"
        }

        async fn fetch(
            &self,
            _symbol: &str,
            _period: HistoryPeriod,
        ) -> forecast_data::Result<HistorySeries> {
            let end = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().date_naive();
            let points = (0..3)
                .map(|i| PricePoint::new(end - Duration::days(2 - i), Decimal::from(2000 + i)))
                .collect();
            Ok(HistorySeries::from_unsorted(points, HistoryOrigin::Live))
        }
    }

    /// 입력 시계열의 출처와 길이를 기록하는 엔진
    #[derive(Default)]
    struct RecordingEngine {
        calls: AtomicUsize,
        last_len: AtomicUsize,
    }

    impl ForecastEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn train_and_predict(
            &self,
            series: &HistorySeries,
            horizon_days: u32,
        ) -> EngineResult<Vec<ForecastPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(series.len(), Ordering::SeqCst);
            let last = series.last().map(|p| p.date).unwrap();
            Ok((1..=i64::from(horizon_days))
                .map(|k| {
                    let v = Decimal::from(2000 + k);
                    ForecastPoint::new(last + Duration::days(k), v, v, v).unwrap()
                })
                .collect())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_short_history_uses_fallback() {
        let engine = Arc::new(RecordingEngine::default());
        let cache = ForecastCache::new(
            CacheSettings::default(),
            Arc::new(ShortSource),
            engine.clone(),
        );

        let snapshot = cache.get_current(now()).await.unwrap();

        assert_eq!(snapshot.origin(), HistoryOrigin::Fallback);
        assert_eq!(snapshot.history_len(), 500);
        assert_eq!(engine.last_len.load(Ordering::SeqCst), 500);
        assert_eq!(snapshot.len(), 90);
        assert!(snapshot.points().iter().all(|p| p.date() > now().date_naive()));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let engine = Arc::new(RecordingEngine::default());
        let cache = ForecastCache::new(CacheSettings::default(), Arc::new(ShortSource), engine);

        let status = cache.status(now()).await;
        assert_eq!(status.state, CacheState::Empty);
        assert_eq!(status.points, 0);
        assert!(cache.peek().await.is_none());

        cache.warm_up(now()).await.unwrap();

        let later = now() + Duration::hours(1);
        let status = cache.status(later).await;
        assert_eq!(status.state, CacheState::Ready);
        assert_eq!(status.points, 90);
        assert_eq!(status.age_secs, Some(3600));
        assert!(status.stale);
        assert_eq!(status.origin, Some(HistoryOrigin::Fallback));
        assert_eq!(status.consecutive_failures, 0);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = CacheSettings::default();
        assert_eq!(settings.symbol, "GC=F");
        assert_eq!(settings.horizon_days, 90);
        assert_eq!(settings.cache_duration, Duration::minutes(30));
        assert_eq!(settings.failure_backoff, Duration::minutes(5));
        assert!(settings.max_consecutive_failures.is_none());
    }

    #[test]
    fn test_refresh_stats_track_failed_attempts() {
        let mut stats = RefreshStats::default();
        let seen = stats.attempts;
        assert!(stats.failed_since(seen).is_none());

        stats.record_failure(now(), &RefreshError::NoFuturePoints);
        assert!(matches!(
            stats.failed_since(seen),
            Some(RefreshError::NoFuturePoints)
        ));
        // 실패 이후 관찰한 대기자는 새로 계산해야 함
        assert!(stats.failed_since(stats.attempts).is_none());

        stats.record_success();
        assert_eq!(stats.attempts, 2);
        assert!(stats.failed_since(seen).is_none());
        assert!(stats.last_error_message().is_none());
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::ColdStart(RefreshError::NoFuturePoints);
        assert_eq!(
            err.to_string(),
            "Initial forecast computation failed: Forecast contains no future dates"
        );
    }
}
