//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod access_config;
mod app_config;
mod manager;

pub use access_config::{AccessCodeEntry, AccessConfig};
pub use app_config::{AppConfig, ServerConfig};
pub use manager::{CONFIG_PATH_ENV, ConfigManager, ENV_PREFIX};

use crate::access::AccessCodeTable;
use crate::ensure_config;
use crate::error::Result;

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // 验证服务器配置
    ensure_config!(config.server.port != 0, "无效的服务器端口: {}", config.server.port);
    ensure_config!(
        config.server.api_prefix.is_empty() || config.server.api_prefix.starts_with('/'),
        "api_prefix 必须以 / 开头: {}",
        config.server.api_prefix
    );
    ensure_config!(config.server.max_request_size > 0, "请求体大小上限必须大于0");

    // 验证访问码条目
    for (index, entry) in config.access.codes.iter().enumerate() {
        if !entry.base_url.is_empty() {
            url::Url::parse(&entry.base_url).map_err(|e| {
                crate::error::GateError::config_with_source(
                    format!("access.codes[{index}] 的 base_url 无效"),
                    e,
                )
            })?;
        }
    }

    // 摘要格式与重复检查在建表时完成
    AccessCodeTable::from_config(&config.access)?;

    Ok(())
}
