//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭, 캐시/갱신 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        // HTTP 요청 지속 시간 히스토그램 버킷 설정
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        // 갱신은 외부 API + 학습을 포함하므로 버킷이 더 넓음
        .set_buckets_for_metric(
            Matcher::Full("forecast_refresh_duration_seconds".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 캐시 메트릭 헬퍼 함수
// ============================================================================

/// 갱신 결과 기록 (`success` | `failure`).
pub fn record_refresh(outcome: &'static str, duration_secs: f64) {
    counter!("forecast_refresh_total", "outcome" => outcome).increment(1);
    histogram!("forecast_refresh_duration_seconds", "outcome" => outcome).record(duration_secs);
}

/// 캐시 조회 결과 기록 (`hit` | `refreshed` | `stale` | `stale_rejected`).
pub fn record_cache_lookup(result: &'static str) {
    counter!("forecast_cache_lookups_total", "result" => result).increment(1);
}

/// 합성 과거 데이터 사용 횟수 증가.
pub fn record_history_fallback() {
    counter!("forecast_history_fallback_total").increment(1);
}

/// 현재 스냅샷 포인트 수 설정.
pub fn set_snapshot_points(points: usize) {
    gauge!("forecast_snapshot_points").set(points as f64);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 라우트 템플릿을 알 수 없을 때 사용하는 경로 라벨.
///
/// 등록되지 않은 경로는 라벨 폭증을 막기 위해 하나로 묶습니다.
pub const UNMATCHED_PATH: &str = "unmatched";

/// 메트릭 라벨로 사용할 경로를 결정합니다.
pub fn path_label(matched: Option<&str>) -> String {
    matched.unwrap_or(UNMATCHED_PATH).to_string()
}
