//! # 测试数据 Fixtures

use crate::access::ScopedConfig;
use crate::client::ClientCredentialState;
use crate::config::{AccessCodeEntry, AppConfig};

/// 示例访问码及其授予的配置
pub const ABCD_CODE: &str = "ABCD";
pub const ABCD_API_KEY: &str = "sk-xyz";
pub const ABCD_BASE_URL: &str = "https://x";
pub const ABCD_DEFAULT_MODEL: &str = "gpt-4";

/// 含一个 `ABCD` 访问码的配置
#[must_use]
pub fn abcd_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.access.codes.push(AccessCodeEntry {
        code: Some(ABCD_CODE.to_string()),
        digest: None,
        api_key: ABCD_API_KEY.to_string(),
        base_url: ABCD_BASE_URL.to_string(),
        custom_models: String::new(),
        default_model: ABCD_DEFAULT_MODEL.to_string(),
    });
    config
}

/// `ABCD` 校验成功时的作用域配置
#[must_use]
pub fn scoped_abcd() -> ScopedConfig {
    ScopedConfig {
        api_key: Some(ABCD_API_KEY.to_string()),
        custom_models: Some(String::new()),
        default_model: Some(ABCD_DEFAULT_MODEL.to_string()),
        base_url: Some(ABCD_BASE_URL.to_string()),
    }
}

/// 只缓存了访问码的客户端状态
#[must_use]
pub fn state_with_code(code: &str) -> ClientCredentialState {
    ClientCredentialState {
        access_code: code.to_string(),
        ..ClientCredentialState::default()
    }
}
