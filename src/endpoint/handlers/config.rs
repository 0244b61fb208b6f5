//! # `/config` 处理器
//!
//! 以访问码换取作用域配置。分支：
//!
//! - 请求体不是合法 JSON（含空的 POST 请求体）→ 400
//! - 无访问码：访问控制关闭 → 200 公开配置；开启 → 401
//! - 有访问码：摘要命中 → 200 作用域配置；未命中 → 403
//!
//! `GET` 不读取请求体，按无访问码处理。

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::endpoint::server::AppState;
use crate::error::AccessError;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

pub async fn handle_config(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Response, AccessError> {
    let request_id = uuid::Uuid::new_v4().to_string();

    let access_code = if method == Method::GET {
        None
    } else {
        extract_access_code(&body).inspect_err(|e| {
            lwarn!(
                request_id,
                LogStage::Authentication,
                LogComponent::ConfigEndpoint,
                "invalid_body",
                format!("rejecting body of {} bytes: {e}", body.len())
            );
        })?
    };

    let Some(code) = access_code else {
        if state.need_code() {
            linfo!(
                request_id,
                LogStage::Authentication,
                LogComponent::ConfigEndpoint,
                "code_required",
                "access control enabled and no access code supplied"
            );
            return Err(AccessError::CodeRequired);
        }
        ldebug!(
            request_id,
            LogStage::Response,
            LogComponent::ConfigEndpoint,
            "danger_config",
            "serving public configuration"
        );
        return Ok(Json(state.danger.clone()).into_response());
    };

    let digest = state.table.digest_of(&code);
    let Some(record) = state.table.get(&digest) else {
        linfo!(
            request_id,
            LogStage::Authentication,
            LogComponent::ConfigEndpoint,
            "invalid_code",
            format!("digest {} not found", digest.short())
        );
        return Err(AccessError::InvalidCode);
    };

    linfo!(
        request_id,
        LogStage::Authentication,
        LogComponent::ConfigEndpoint,
        "code_accepted",
        format!("digest {} granted", digest.short())
    );
    Ok(Json(record.scoped_config(state.hide_user_api_key())).into_response())
}

/// 读取非空字符串形式的 `accessCode`；缺失、空串或非字符串都视为未提供
pub fn extract_access_code(body: &[u8]) -> Result<Option<String>, AccessError> {
    let value: Value = serde_json::from_slice(body).map_err(AccessError::InvalidJson)?;
    Ok(value
        .get("accessCode")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(br#"{"accessCode":"ABCD"}"#.as_slice(), Some("ABCD"))]
    #[case(br#"{"accessCode":""}"#.as_slice(), None)]
    #[case(br#"{"accessCode":1234}"#.as_slice(), None)]
    #[case(br#"{"accessCode":null}"#.as_slice(), None)]
    #[case(br"{}".as_slice(), None)]
    #[case(br"[1,2]".as_slice(), None)]
    fn access_code_extraction(#[case] body: &[u8], #[case] expected: Option<&str>) {
        let code = extract_access_code(body).unwrap();
        assert_eq!(code.as_deref(), expected);
    }

    #[rstest]
    #[case(b"".as_slice())]
    #[case(b"{not json".as_slice())]
    #[case(b"accessCode=ABCD".as_slice())]
    fn malformed_bodies_are_invalid_json(#[case] body: &[u8]) {
        assert!(matches!(
            extract_access_code(body),
            Err(AccessError::InvalidJson(_))
        ));
    }
}
