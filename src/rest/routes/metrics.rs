use crate::AppContext;
use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

pub async fn get_metrics(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let body = ctx.metrics.render_prometheus();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
