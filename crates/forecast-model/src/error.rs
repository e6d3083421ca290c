//! 예측 엔진 에러 타입.

use thiserror::Error;

/// 학습/예측 중 발생할 수 있는 에러.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// 학습을 위한 데이터 부족
    #[error("Insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// 분산이 없는 등 학습할 수 없는 시계열
    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    /// 계산 결과가 유한하지 않거나 표현 불가
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// 유효하지 않은 파라미터
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type EngineResult<T> = Result<T, EngineError>;
