//! # 错误处理测试

use crate::error::{AccessError, Context, ErrorCategory, GateError, ProviderError};
use axum::http::StatusCode;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = GateError::config("测试配置错误");
    assert!(matches!(err, GateError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = GateError::config_with_source("配置文件加载失败", io_err);

    assert!(matches!(err, GateError::Config { .. }));
    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err: GateError = io_err.into();

    assert!(matches!(err, GateError::Io { .. }));
    assert!(err.to_string().contains("IO错误: 文件操作失败"));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: GateError = toml_err.into();

    assert!(matches!(err, GateError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_context_wraps_and_keeps_status() {
    let result: Result<(), GateError> = Err(GateError::transport("连接被拒绝"));
    let err = result.context("校验访问码").unwrap_err();

    assert!(matches!(err, GateError::Context { .. }));
    assert!(err.is_transport());
    assert_eq!(err.to_http_response_parts().0, StatusCode::BAD_GATEWAY);
    assert!(err.to_string().starts_with("校验访问码"));
}

#[test]
fn test_error_category() {
    assert_eq!(
        GateError::validation("bad body").category(),
        ErrorCategory::Client
    );
    assert_eq!(
        GateError::authentication("missing").category(),
        ErrorCategory::Client
    );
    assert_eq!(GateError::internal("boom").category(), ErrorCategory::Server);
}

#[test]
fn test_access_error_public_messages() {
    let invalid = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let cases = [
        (AccessError::InvalidJson(invalid), 400, "Invalid JSON format"),
        (AccessError::CodeRequired, 401, "Access code required"),
        (AccessError::InvalidCode, 403, "Invalid access code"),
        (
            AccessError::Internal(GateError::internal("table poisoned")),
            500,
            "Internal Server Error",
        ),
    ];

    for (err, status, message) in cases {
        assert_eq!(err.status().as_u16(), status);
        assert_eq!(err.public_message(), message);
        assert!(!err.public_message().contains("poisoned"));
    }
}

#[test]
fn test_provider_error_conversion() {
    let err: GateError = ProviderError::unsupported("anthropic", "speech").into();
    match err {
        GateError::Provider { provider, .. } => assert_eq!(provider, "anthropic"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_ensure_config_macro() {
    fn check(port: u16) -> crate::error::Result<()> {
        crate::ensure_config!(port != 0, "无效的服务器端口: {}", port);
        Ok(())
    }

    assert!(check(3000).is_ok());
    let err = check(0).unwrap_err();
    assert_eq!(err.to_string(), "配置错误: 无效的服务器端口: 0");
}
