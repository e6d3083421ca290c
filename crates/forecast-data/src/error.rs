//! 시세 데이터 조회 오류 타입.

use thiserror::Error;

/// 과거 데이터 조회 오류.
///
/// 갱신 사이클에서는 모두 합성 데이터로 대체되어 호출자에게 노출되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// 커넥터 생성 실패
    #[error("Connection error: {0}")]
    Connection(String),

    /// API 요청 실패
    #[error("Fetch error ({symbol}): {message}")]
    Fetch { symbol: String, message: String },

    /// 응답 파싱 실패
    #[error("Parse error: {0}")]
    Parse(String),

    /// 응답에 데이터 없음
    #[error("No data for symbol {0}")]
    Empty(String),

    /// 학습에 필요한 포인트 수 미달
    #[error("Insufficient history: need {required} points, got {actual}")]
    Insufficient { required: usize, actual: usize },
}

impl HistoryError {
    /// 네트워크 계층 장애인지 확인합니다.
    pub fn is_transport(&self) -> bool {
        matches!(self, HistoryError::Connection(_) | HistoryError::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
