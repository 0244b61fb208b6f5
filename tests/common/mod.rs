//! 集成测试共享工具
#![allow(dead_code)]

use access_gate::config::{AccessCodeEntry, AppConfig};
use access_gate::endpoint::ConfigServer;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

pub const ABCD_CODE: &str = "ABCD";
pub const ABCD_API_KEY: &str = "sk-xyz";
pub const ABCD_BASE_URL: &str = "https://x";
pub const ABCD_DEFAULT_MODEL: &str = "gpt-4";

/// 一个 `ABCD` 访问码条目
pub fn abcd_entry() -> AccessCodeEntry {
    AccessCodeEntry {
        api_key: ABCD_API_KEY.to_string(),
        base_url: ABCD_BASE_URL.to_string(),
        default_model: ABCD_DEFAULT_MODEL.to_string(),
        ..AccessCodeEntry::with_code(ABCD_CODE)
    }
}

/// 仅含 `ABCD` 的配置
pub fn abcd_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.access.codes.push(abcd_entry());
    config
}

/// 没有任何访问码、访问控制关闭的配置
pub fn open_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.access.custom_models = "-all,+gpt-4o".to_string();
    config.access.default_model = "gpt-4o".to_string();
    config
}

pub fn router(config: &AppConfig) -> Router {
    ConfigServer::new(config).expect("valid config").router()
}

/// 发送请求并返回状态码与 JSON 响应体
pub async fn send(router: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn post_config(router: &Router, body: &str) -> (StatusCode, Value) {
    send(router, Method::POST, "/api/config", body).await
}
