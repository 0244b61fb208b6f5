//! # 校验端点
//!
//! axum 服务：`{prefix}/config` 以访问码换取作用域配置，`{prefix}/health` 报告访问控制状态。

pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;

pub use response::{ErrorBody, error_json, handle_panic};
pub use server::{AccessContext, AppState, ConfigServer, with_middleware};
