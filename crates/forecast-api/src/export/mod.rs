//! 예측 구간 내보내기.
//!
//! 조회 범위의 예측을 CSV 또는 XLSX 파일로 변환합니다.
//! 열 구성은 `ds, yhat, yhat_lower, yhat_upper` 입니다.

mod csv;
mod xlsx;

pub use self::csv::to_csv;
pub use self::xlsx::{to_xlsx, SHEET_NAME};

use forecast_core::DateRange;
use thiserror::Error;

/// 내보내기 열 헤더
pub const COLUMNS: [&str; 4] = ["ds", "yhat", "yhat_lower", "yhat_upper"];

/// 내보내기 오류.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Value not representable: {0}")]
    Value(String),
}

/// 내보내기 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// 첨부 파일 이름 (예: `gold_forecast_2025-01-01_to_2025-01-31.csv`)
pub fn export_filename(prefix: &str, range: &DateRange, format: ExportFormat) -> String {
    format!(
        "{}_{}_to_{}.{}",
        prefix,
        range.start(),
        range.end(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_export_filename() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        )
        .unwrap();

        assert_eq!(
            export_filename("gold_forecast", &range, ExportFormat::Csv),
            "gold_forecast_2025-01-01_to_2025-01-31.csv"
        );
        assert_eq!(
            export_filename("gold_forecast", &range, ExportFormat::Xlsx),
            "gold_forecast_2025-01-01_to_2025-01-31.xlsx"
        );
    }
}
