//! 健康检查处理器

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::endpoint::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub access_control: bool,
    pub codes: usize,
    pub timestamp: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        access_control: state.need_code(),
        codes: state.table.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
