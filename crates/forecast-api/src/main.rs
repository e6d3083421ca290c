//! 원자재 가격 예측 API 서버.
//!
//! 설정을 읽고 첫 예측을 계산한 뒤 Axum 서버를 시작합니다.
//! 첫 예측 계산에 실패하면 서버를 시작하지 않습니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use forecast_api::cache::{CacheSettings, ForecastCache};
use forecast_api::metrics::setup_metrics_recorder;
use forecast_api::middleware::metrics_layer;
use forecast_api::openapi::swagger_ui_router;
use forecast_api::routes::create_api_router;
use forecast_api::state::AppState;
use forecast_core::logging::{init_logging, LogConfig};
use forecast_core::AppConfig;
use forecast_data::YahooHistorySource;
use forecast_model::{SeasonalTrendConfig, SeasonalTrendEngine};

/// CORS 레이어 생성.
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://dashboard.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("CORS_ORIGINS not set or invalid, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        // any origin과 credentials는 함께 사용할 수 없음
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .merge(swagger_ui_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 갱신은 외부 API와 학습을 포함하므로 설정값 사용 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그가 있으면 OpenAPI JSON 스펙을 stdout으로 출력합니다.
fn export_openapi_requested() -> anyhow::Result<bool> {
    use forecast_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    if !std::env::args().any(|arg| arg == "--export-openapi") {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    println!("{}", json);
    Ok(true)
}

fn build_engine(config: &AppConfig) -> anyhow::Result<SeasonalTrendEngine> {
    let engine_config = SeasonalTrendConfig::default()
        .with_alpha(config.engine.alpha)
        .with_beta(config.engine.beta)
        .with_interval_width(config.engine.interval_width)
        // 실제 데이터로 인정된 시계열은 엔진도 학습할 수 있어야 함
        .with_min_points(config.forecast.min_history_points.max(2));

    SeasonalTrendEngine::new(engine_config).context("invalid engine configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if export_openapi_requested()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from_config(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;

    info!(
        profile = config.profile.as_str(),
        symbol = %config.forecast.symbol,
        horizon_days = config.forecast.horizon_days,
        cache_secs = config.cache.duration_secs,
        "Starting forecast API server..."
    );

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid socket address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let source = YahooHistorySource::new().context("failed to create Yahoo Finance connector")?;
    let engine = build_engine(&config)?;
    let cache = ForecastCache::new(
        CacheSettings::from_config(&config),
        Arc::new(source),
        Arc::new(engine),
    );

    // 첫 예측 계산 (실패 시 종료)
    match cache.warm_up(Utc::now()).await {
        Ok(snapshot) => info!(
            points = snapshot.len(),
            origin = %snapshot.origin(),
            "Initial forecast ready"
        ),
        Err(e) => {
            error!(error = %e, "Initial forecast failed, aborting startup");
            return Err(e.into());
        }
    }

    let state = Arc::new(AppState::new(config, cache));
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state, metrics_handle, request_timeout);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
