//! # 路由配置

use axum::Router;
use axum::routing::get;

use super::handlers;
use super::server::AppState;

/// 创建前缀下的全部路由；未注册的方法由 axum 返回 405
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/config",
            get(handlers::handle_config).post(handlers::handle_config),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
