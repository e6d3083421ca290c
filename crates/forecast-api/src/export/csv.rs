//! CSV 내보내기.

use forecast_core::{ForecastPoint, DATE_FORMAT};

use super::{ExportError, COLUMNS};

/// 예측 포인트를 CSV 바이트로 변환합니다. 헤더 행을 포함합니다.
pub fn to_csv(points: &[ForecastPoint]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = ::csv::Writer::from_writer(Vec::new());

    wtr.write_record(COLUMNS)?;
    for point in points {
        wtr.write_record([
            point.date().format(DATE_FORMAT).to_string(),
            point.predicted().to_string(),
            point.lower_bound().to_string(),
            point.upper_bound().to_string(),
        ])?;
    }

    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}
