//! 기본 화면.
//!
//! 마지막 갱신 시각, 향후 N일 예측 표, 요약 통계를 HTML로 렌더링합니다.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{extract::State, response::Html};
use chrono::Utc;

use forecast_core::{ForecastPoint, ForecastSnapshot, ForecastSummary, QueryView, DATE_FORMAT};

use crate::error::{ApiErrorResponse, ApiResult, IntoApiError};
use crate::state::AppState;

const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// HTML 특수 문자 이스케이프.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_rows(out: &mut String, points: &[ForecastPoint]) {
    for p in points {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            p.date().format(DATE_FORMAT),
            p.predicted(),
            p.lower_bound(),
            p.upper_bound()
        );
    }
}

fn render_summary(out: &mut String, summary: Option<ForecastSummary>) {
    match summary {
        Some(s) => {
            let _ = writeln!(
                out,
                "<ul class=\"summary\">\
                 <li>Average: <strong>{:.2}$</strong></li>\
                 <li>High: <strong>{:.2}$</strong> on {}</li>\
                 <li>Low: <strong>{:.2}$</strong> on {}</li>\
                 </ul>",
                s.average,
                s.max.price,
                s.max.date.format(DATE_FORMAT),
                s.min.price,
                s.min.date.format(DATE_FORMAT)
            );
        }
        None => out.push_str("<p>No forecast data.</p>\n"),
    }
}

/// 스냅샷 미리보기 페이지를 렌더링합니다.
pub fn render_index(symbol: &str, snapshot: &ForecastSnapshot, preview_days: usize) -> String {
    let preview = QueryView::new(snapshot).head(preview_days);
    let symbol = escape(symbol);
    let mut out = String::with_capacity(4096);

    let _ = writeln!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{symbol} price forecast</title>\n</head>\n<body>\n\
         <h1>{symbol} price forecast</h1>\n\
         <p class=\"last-update\">Last update: {} UTC ({} history)</p>",
        snapshot.computed_at().format(LAST_UPDATE_FORMAT),
        snapshot.origin(),
    );

    let _ = writeln!(out, "<h2>Next {} days</h2>", preview.len());
    out.push_str(
        "<table>\n<thead><tr><th>Date</th><th>Forecast</th><th>Lower</th><th>Upper</th></tr></thead>\n<tbody>\n",
    );
    render_rows(&mut out, preview);
    out.push_str("</tbody>\n</table>\n");

    out.push_str("<h2>Summary</h2>\n");
    render_summary(&mut out, QueryView::summarize(preview));

    out.push_str(
        "<form action=\"/export-csv\" method=\"get\">\n\
         <input type=\"date\" name=\"start_date\" required>\n\
         <input type=\"date\" name=\"end_date\" required>\n\
         <button type=\"submit\">CSV</button>\n\
         <button type=\"submit\" formaction=\"/export-excel\">Excel</button>\n\
         </form>\n</body>\n</html>\n",
    );

    out
}

/// 기본 화면.
#[utoipa::path(
    get,
    path = "/",
    tag = "forecast",
    responses(
        (status = 200, description = "예측 미리보기 HTML", body = String, content_type = "text/html"),
        (status = 503, description = "예측을 계산할 수 없음", body = ApiErrorResponse)
    )
)]
pub async fn index(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let snapshot = state
        .cache
        .get_current(Utc::now())
        .await
        .map_err(IntoApiError::into_api_error)?;

    Ok(Html(render_index(
        state.symbol(),
        &snapshot,
        state.config.forecast.preview_days,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use forecast_core::HistoryOrigin;
    use rust_decimal::Decimal;

    fn snapshot(days: i64) -> ForecastSnapshot {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 8, 30, 0).unwrap();
        let curve = (1..=days)
            .map(|k| {
                let v = Decimal::from(2000 + k);
                ForecastPoint::new(now.date_naive() + Duration::days(k), v, v - Decimal::TEN, v + Decimal::TEN)
                    .unwrap()
            })
            .collect();
        ForecastSnapshot::from_curve(curve, now, HistoryOrigin::Live, 500)
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("GC=F"), "GC=F");
        assert_eq!(escape("<b>\"x\"&'y'"), "&lt;b&gt;&quot;x&quot;&amp;&#39;y&#39;");
    }

    #[test]
    fn test_render_index_preview() {
        let html = render_index("GC=F", &snapshot(90), 30);

        assert!(html.contains("Last update: 2025-01-01 08:30 UTC (live history)"));
        assert!(html.contains("<h2>Next 30 days</h2>"));
        assert_eq!(html.matches("<tr><td>").count(), 30);
        assert!(html.contains("<tr><td>2025-01-02</td><td>2001.00</td><td>1991.00</td><td>2011.00</td></tr>"));
        assert!(!html.contains("<td>2025-02-01</td>"));
        // 2001..=2030 평균 2015.5, 최고 2030 (01-31), 최저 2001 (01-02)
        assert!(html.contains("Average: <strong>2015.50$</strong>"));
        assert!(html.contains("High: <strong>2030.00$</strong> on 2025-01-31"));
        assert!(html.contains("Low: <strong>2001.00$</strong> on 2025-01-02"));
    }

    #[test]
    fn test_render_index_escapes_symbol() {
        let html = render_index("<script>", &snapshot(3), 30);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<h2>Next 3 days</h2>"));
    }
}
