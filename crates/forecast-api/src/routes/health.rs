//! 헬스 체크 endpoint.
//!
//! 캐시 상태를 보고하며 갱신을 유발하지 않습니다.
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use forecast_core::HistoryOrigin;

use crate::cache::{CacheState, CacheStatus};
use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded" | "empty")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 마지막 예측 계산 시각 (ISO 8601)
    pub last_update: Option<String>,

    /// 현재 스냅샷 예측 포인트 수
    pub forecast_count: usize,

    /// 스냅샷 경과 시간 (시간)
    pub cache_age_hours: Option<f64>,

    /// 캐시 상세 상태
    pub cache: CacheHealth,
}

/// 캐시 상세 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CacheHealth {
    /// "empty" | "refreshing" | "ready" | "failed"
    pub state: String,
    /// 만료 여부
    pub stale: bool,
    /// 학습 데이터 출처
    pub origin: Option<HistoryOrigin>,
    /// 연속 갱신 실패 횟수
    pub consecutive_failures: u32,
    /// 마지막 갱신 실패 메시지
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<&CacheStatus> for CacheHealth {
    fn from(status: &CacheStatus) -> Self {
        let state = match status.state {
            CacheState::Empty => "empty",
            CacheState::Refreshing => "refreshing",
            CacheState::Ready => "ready",
            CacheState::Failed => "failed",
        };
        Self {
            state: state.to_string(),
            stale: status.stale,
            origin: status.origin,
            consecutive_failures: status.consecutive_failures,
            last_error: status.last_error.clone(),
        }
    }
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// 정상 상태.
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    /// 비정상 상태.
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Readiness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadyResponse {
    /// "ready" | "not_ready"
    pub status: String,
    /// 예측 캐시 상태
    pub forecast: ComponentStatus,
}

fn overall_status(status: &CacheStatus) -> &'static str {
    match (status.points, status.consecutive_failures) {
        (0, _) => "empty",
        (_, 0) => "healthy",
        _ => "degraded",
    }
}

/// 캐시 헬스 체크.
///
/// 현재 스냅샷 정보를 보고합니다. 예측을 계산하지 않습니다.
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "서비스 상태", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = Utc::now();
    let status = state.cache.status(now).await;

    Json(HealthResponse {
        status: overall_status(&status).to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: now.to_rfc3339(),
        last_update: status.computed_at.map(|t| t.to_rfc3339()),
        forecast_count: status.points,
        cache_age_hours: status.age_secs.map(|secs| secs as f64 / 3600.0),
        cache: CacheHealth::from(&status),
    })
}

/// Readiness probe.
///
/// 스냅샷이 있으면 200, 없으면 503.
/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = ReadyResponse),
        (status = 503, description = "예측 스냅샷 없음", body = ReadyResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.cache.peek().await {
        Some(snapshot) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                forecast: ComponentStatus::up_with_info(format!(
                    "{} points computed at {}",
                    snapshot.len(),
                    snapshot.computed_at().to_rfc3339()
                )),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not_ready".to_string(),
                forecast: ComponentStatus::down("no forecast computed yet"),
            }),
        ),
    }
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
