//! 설정 관리.
//!
//! 설정은 다음 순서로 병합됩니다 (뒤가 우선):
//! 1. 프로필별 기본값 (`APP_ENV`: `development` | `production`)
//! 2. 설정 파일 (`config/default.toml`, 선택)
//! 3. `FORECAST__` 접두사 환경 변수 (예: `FORECAST__CACHE__DURATION_SECS=7200`)
//! 4. 기존 배포 호환 환경 변수 (`CACHE_DURATION_HOURS`, `FORECAST_PERIOD_DAYS`,
//!    `DATA_PERIOD_YEARS`, `YFINANCE_SYMBOL`, `PORT`, `LOG_LEVEL`)

use std::collections::HashMap;
use std::path::Path;

use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 실행 프로필.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// 개발: 캐시 30분
    #[default]
    Development,
    /// 운영: 캐시 2시간
    Production,
}

impl Profile {
    /// 알 수 없는 값은 개발 프로필로 취급합니다.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("production") | Some("prod") => Profile::Production,
            _ => Profile::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }

    /// 프로필별 기본 캐시 유효 시간 (초)
    pub fn default_cache_duration_secs(&self) -> u64 {
        match self {
            Profile::Development => 30 * 60,
            Profile::Production => 2 * 60 * 60,
        }
    }
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 실행 프로필
    #[serde(default)]
    pub profile: Profile,
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 예측 대상 및 범위 설정
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// 캐시 갱신 정책
    #[serde(default)]
    pub cache: CacheConfig,
    /// 예측 엔진 파라미터
    #[serde(default)]
    pub engine: EngineConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초). 진행 중인 갱신 작업은 중단되지 않습니다.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            request_timeout_secs: 120,
        }
    }
}

/// 예측 대상 및 범위 설정.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ForecastConfig {
    /// 시세 심볼 (Yahoo Finance 형식)
    #[validate(custom(function = "validate_symbol"))]
    pub symbol: String,
    /// 학습에 사용할 과거 데이터 기간 (년)
    #[validate(range(min = 1, message = "forecast.history_years must be at least 1"))]
    pub history_years: u32,
    /// 예측 기간 (일)
    #[validate(range(min = 1, message = "forecast.horizon_days must be at least 1"))]
    pub horizon_days: u32,
    /// 실제 데이터로 인정할 최소 포인트 수. 미만이면 합성 데이터 사용
    pub min_history_points: usize,
    /// 합성 데이터 포인트 수
    pub fallback_points: usize,
    /// 기본 화면 미리보기 일수
    pub preview_days: usize,
    /// 내보내기 파일명 접두사
    pub export_prefix: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            symbol: "GC=F".to_string(),
            history_years: 2,
            horizon_days: 90,
            min_history_points: 10,
            fallback_points: 500,
            preview_days: 30,
            export_prefix: "gold_forecast".to_string(),
        }
    }
}

/// 캐시 갱신 정책.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// 스냅샷 유효 시간 (초)
    #[validate(range(min = 1, message = "cache.duration_secs must be at least 1"))]
    pub duration_secs: u64,
    /// 갱신 실패 후 재시도를 미루는 시간 (초)
    pub failure_backoff_secs: u64,
    /// 연속 실패가 이 값에 도달하면 만료 스냅샷 제공을 중단. 미설정 시 무기한 제공
    #[validate(range(
        min = 1,
        message = "cache.max_consecutive_failures must be at least 1 when set"
    ))]
    pub max_consecutive_failures: Option<u32>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            duration_secs: Profile::Development.default_cache_duration_secs(),
            failure_backoff_secs: 300,
            max_consecutive_failures: None,
        }
    }
}

impl CacheConfig {
    pub fn duration(&self) -> chrono::Duration {
        seconds(self.duration_secs)
    }

    pub fn failure_backoff(&self) -> chrono::Duration {
        seconds(self.failure_backoff_secs)
    }
}

/// 예측 엔진 파라미터.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// 레벨 평활 계수 (0, 1)
    #[validate(
        range(exclusive_min = 0.0, exclusive_max = 1.0, message = "engine.alpha must be in (0, 1)"),
        custom(function = "validate_finite")
    )]
    pub alpha: f64,
    /// 추세 평활 계수 (0, 1)
    #[validate(
        range(exclusive_min = 0.0, exclusive_max = 1.0, message = "engine.beta must be in (0, 1)"),
        custom(function = "validate_finite")
    )]
    pub beta: f64,
    /// 신뢰 구간 폭 (0, 1)
    #[validate(
        range(
            exclusive_min = 0.0,
            exclusive_max = 1.0,
            message = "engine.interval_width must be in (0, 1)"
        ),
        custom(function = "validate_finite")
    )]
    pub interval_width: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.05,
            interval_width: 0.8,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 프로세스 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_with(Some(path.as_ref()), &vars)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// 주어진 환경 변수 맵으로 설정을 로드합니다. 파일이 없으면 건너뜁니다.
    pub fn load_with(
        path: Option<&Path>,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let profile = Profile::parse(vars.get("APP_ENV").map(String::as_str));

        let mut builder = config::Config::builder()
            .set_default("profile", profile.as_str())?
            .set_default(
                "cache.duration_secs",
                i64::try_from(profile.default_cache_duration_secs()).unwrap_or(i64::MAX),
            )?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("FORECAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        let legacy_cache_secs = vars
            .get("CACHE_DURATION_HOURS")
            .and_then(|h| h.trim().parse::<f64>().ok())
            .filter(|h| h.is_finite() && *h > 0.0)
            .map(|h| (h * 3600.0).round() as i64);

        builder = builder
            .set_override_option("cache.duration_secs", legacy_cache_secs)?
            .set_override_option("forecast.horizon_days", parse_var::<u32>(vars, "FORECAST_PERIOD_DAYS").map(i64::from))?
            .set_override_option("forecast.history_years", parse_var::<u32>(vars, "DATA_PERIOD_YEARS").map(i64::from))?
            .set_override_option("forecast.symbol", vars.get("YFINANCE_SYMBOL").cloned())?
            .set_override_option("server.port", parse_var::<u16>(vars, "PORT").map(i64::from))?
            .set_override_option("logging.level", vars.get("LOG_LEVEL").map(|l| l.to_lowercase()))?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 섹션별 값 범위를 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_section("forecast", &self.forecast)?;
        validate_section("cache", &self.cache)?;
        validate_section("engine", &self.engine)
    }
}

// ==================== 커스텀 검증 함수 ====================

/// 공백만 있는 심볼 거부
fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.trim().is_empty() {
        return Err(ValidationError::new("symbol_empty")
            .with_message("forecast.symbol must not be empty".into()));
    }
    Ok(())
}

/// NaN/무한대 거부. `range`는 NaN을 통과시키므로 함께 사용합니다.
pub fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new("not_finite").with_message("value must be finite".into()));
    }
    Ok(())
}

/// 검증 에러를 한 줄 메시지로 합칩니다. 필드 이름 순으로 정렬합니다.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: invalid value", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn validate_section(name: &str, section: &impl Validate) -> Result<(), ConfigError> {
    section.validate().map_err(|errors| {
        ConfigError::Message(format!(
            "invalid {} configuration: {}",
            name,
            validation_message(&errors)
        ))
    })
}

fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

fn parse_var<T: std::str::FromStr>(vars: &HashMap<String, String>, key: &str) -> Option<T> {
    vars.get(key).and_then(|v| v.trim().parse().ok())
}
