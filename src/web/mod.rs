/// HTTP surface: page shell, chart rendering and student lookup.
pub mod error;
pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/static/script.js", get(handlers::script))
        .route("/charts", get(handlers::chart_list))
        .route("/plot/:graph_type", get(handlers::plot))
        .route("/student/:student_id", get(handlers::student))
        .with_state(state)
}
