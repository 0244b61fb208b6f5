//! # 认证头解析
//!
//! 根据当前服务商、凭据快照与宿主环境，决定出站请求携带的认证头。
//! 纯函数，不做任何 I/O。
//!
//! 优先级：
//! 1. 服务商自己的密钥（非空，去除首尾空白后）：使用该服务商的头名称，
//!    仅 `Authorization` 头加 `Bearer ` 前缀；
//! 2. 否则若启用访问控制且缓存了访问码：`Authorization: Bearer nk-<code>`；
//! 3. 否则不携带认证头。

use std::fmt;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::descriptor::{AUTHORIZATION_HEADER, descriptor};
use super::types::ServiceProvider;
use crate::client::ClientCredentialState;
use crate::error::{GateError, Result};
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 访问码凭据的前缀，网关据此区分访问码与直连密钥
pub const ACCESS_CODE_PREFIX: &str = "nk-";

/// 宿主环境
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostContext {
    /// 是否运行在打包的桌面应用内
    pub is_app: bool,
}

impl HostContext {
    #[must_use]
    pub const fn browser() -> Self {
        Self { is_app: false }
    }

    #[must_use]
    pub const fn app() -> Self {
        Self { is_app: true }
    }

    /// 桌面应用内百度请求由宿主代为签名，不携带认证头
    #[must_use]
    pub fn suppresses_auth(self, provider: ServiceProvider) -> bool {
        self.is_app && provider == ServiceProvider::Baidu
    }
}

/// 解析出的认证头
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    pub name: &'static str,
    pub value: String,
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// 返回 `Bearer <token>`；`Authorization` 以外的头直接使用原值
fn header_value(name: &str, token: &str) -> String {
    if name == AUTHORIZATION_HEADER {
        format!("Bearer {token}")
    } else {
        token.to_string()
    }
}

/// 计算认证头，最多一个
#[must_use]
pub fn resolve_auth_header(
    provider: ServiceProvider,
    credentials: &ClientCredentialState,
    host: &HostContext,
) -> Option<AuthHeader> {
    if host.suppresses_auth(provider) {
        return None;
    }

    let name = descriptor(provider).auth_header_name;
    let candidate = credentials.candidate_credential(provider);
    let candidate = candidate.trim();

    if !candidate.is_empty() {
        return Some(AuthHeader {
            name,
            value: header_value(name, candidate),
        });
    }

    if credentials.flags.need_code && credentials.has_access_code() {
        let token = format!("{ACCESS_CODE_PREFIX}{}", credentials.access_code.trim());
        return Some(AuthHeader {
            name: AUTHORIZATION_HEADER,
            value: header_value(AUTHORIZATION_HEADER, &token),
        });
    }

    None
}

/// 构造出站请求头
///
/// `ignore_headers` 为真时只携带认证头（例如 multipart 上传由客户端库决定内容类型）。
pub fn build_headers(
    provider: ServiceProvider,
    credentials: &ClientCredentialState,
    host: &HostContext,
    ignore_headers: bool,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if !ignore_headers {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    }

    let auth = resolve_auth_header(provider, credentials, host);
    ldebug!(
        "client",
        LogStage::RequestModify,
        LogComponent::HeaderResolver,
        "build_headers",
        format!(
            "provider={} auth_header={}",
            provider,
            auth.as_ref().map_or("none", |h| h.name)
        )
    );

    if let Some(auth) = auth {
        let name = HeaderName::from_bytes(auth.name.as_bytes())
            .map_err(|e| GateError::validation_with_source("invalid auth header name", e))?;
        let mut value = HeaderValue::from_str(&auth.value)
            .map_err(|e| GateError::validation_with_source("credential is not a valid header value", e))?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }

    Ok(headers)
}
