//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use forecast_core::HistoryOrigin;

use crate::error::ApiErrorResponse;
use crate::routes::{
    CacheHealth, ComponentStatus, ForecastResponse, ForecastRow, HealthResponse, ReadyResponse,
    SummaryDto,
};

/// Forecast API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Commodity Forecast API",
        description = r#"
# 원자재 가격 예측 API

과거 일별 종가로 학습한 향후 90일 가격 예측을 제공합니다.

## 주요 기능

- **예측 조회**: 날짜 범위별 예측값과 신뢰 구간, 요약 통계
- **내보내기**: CSV / Excel 파일
- **헬스 체크**: 캐시 상태 및 마지막 갱신 시각

예측은 캐시되며 유효 시간이 지나면 다음 요청에서 갱신됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5001", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "forecast", description = "예측 - 범위 조회 및 미리보기"),
        (name = "export", description = "내보내기 - CSV / XLSX"),
        (name = "health", description = "헬스 체크 - 캐시 상태 확인")
    ),
    components(
        schemas(
            // ===== Forecast =====
            ForecastResponse,
            ForecastRow,
            SummaryDto,
            HistoryOrigin,

            // ===== Health =====
            HealthResponse,
            CacheHealth,
            ReadyResponse,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
        )
    ),
    paths(
        crate::routes::page::index,
        crate::routes::forecast::get_forecast,
        crate::routes::export::export_csv,
        crate::routes::export::export_excel,
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
