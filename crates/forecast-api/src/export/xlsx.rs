//! XLSX 내보내기.

use forecast_core::{ForecastPoint, DATE_FORMAT};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};

use super::{ExportError, COLUMNS};

/// 워크시트 이름
pub const SHEET_NAME: &str = "Forecast";

const PRICE_FORMAT: &str = "0.00";

fn number(value: Decimal) -> Result<f64, ExportError> {
    value
        .to_f64()
        .ok_or_else(|| ExportError::Value(value.to_string()))
}

/// 예측 포인트를 단일 시트 XLSX 워크북 바이트로 변환합니다.
pub fn to_xlsx(points: &[ForecastPoint]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let price = Format::new().set_num_format(PRICE_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_column_width(0, 12)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, point) in points.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, point.date().format(DATE_FORMAT).to_string())?;
        sheet.write_number_with_format(row, 1, number(point.predicted())?, &price)?;
        sheet.write_number_with_format(row, 2, number(point.lower_bound())?, &price)?;
        sheet.write_number_with_format(row, 3, number(point.upper_bound())?, &price)?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_xlsx_produces_zip_archive() {
        let points = vec![ForecastPoint::new(
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            dec!(2650.46),
            dec!(2600.10),
            dec!(2700.00),
        )
        .unwrap()];

        let bytes = to_xlsx(&points).unwrap();

        // XLSX는 ZIP 컨테이너
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }
}
