use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use log::{debug, warn};
use serde::Serialize;

use super::error::ApiError;
use crate::charts::{self, ChartKind};
use crate::data::model::Record;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");
const SCRIPT_JS: &str = include_str!("../../assets/script.js");

#[derive(Debug, Serialize)]
pub struct PlotResponse {
    pub img: String,
}

#[derive(Debug, Serialize)]
pub struct ChartSummary {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], SCRIPT_JS)
}

/// `GET /charts` – the chart table in registration order.
pub async fn chart_list() -> Json<Vec<ChartSummary>> {
    Json(
        charts::CHARTS
            .iter()
            .map(|spec| ChartSummary {
                id: spec.id,
                title: spec.title,
                kind: spec.kind,
            })
            .collect(),
    )
}

/// `GET /plot/{graph_type}` – render one chart as a base64 PNG.
pub async fn plot(
    State(state): State<AppState>,
    Path(graph_type): Path<String>,
) -> Result<Json<PlotResponse>, ApiError> {
    let spec = charts::lookup(&graph_type).ok_or_else(|| ApiError::UnknownChart(graph_type))?;
    debug!("rendering chart {}", spec.id);

    // Drawing is CPU-bound; keep it off the async workers.
    let dataset = Arc::clone(&state.dataset);
    let img = tokio::task::spawn_blocking(move || charts::render_chart(spec, &dataset))
        .await
        .map_err(anyhow::Error::from)??;

    Ok(Json(PlotResponse { img }))
}

/// `GET /student/{student_id}` – one row by 0-based position.
pub async fn student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let record = parse_index(&student_id)
        .and_then(|index| state.dataset.row(index))
        .ok_or_else(|| {
            warn!(
                "student '{student_id}' not found ({} rows)",
                state.dataset.len()
            );
            ApiError::StudentNotFound
        })?;
    Ok(Json(record.clone()))
}

/// A row index is plain ASCII digits; signs, spaces and the like are rejected.
fn parse_index(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_must_be_plain_digits() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("042"), Some(42));
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index(" 1"), None);
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("99999999999999999999999"), None);
    }
}
