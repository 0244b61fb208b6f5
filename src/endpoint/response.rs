//! # 端点响应
//!
//! 所有失败都以 `{"error": "<message>"}` 形式返回，内部细节只进日志。

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AccessError;
use crate::lerror;
use crate::logging::{LogComponent, LogStage};

/// 错误响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 构造 `{"error": message}` 响应
pub fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        if let Self::Internal(inner) = &self {
            lerror!(
                "system",
                LogStage::Response,
                LogComponent::ConfigEndpoint,
                "internal_error",
                format!("category={:?} {inner}", inner.category())
            );
        }
        error_json(self.status(), self.public_message())
    }
}

/// `CatchPanicLayer` 的响应构造器
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    lerror!(
        "system",
        LogStage::Response,
        LogComponent::ConfigEndpoint,
        "handler_panic",
        format!("handler panicked: {detail}")
    );
    error_json(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
