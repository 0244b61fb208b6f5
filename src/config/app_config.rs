//! # 应用配置结构定义

use super::AccessConfig;
use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 访问控制配置
    pub access: AccessConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 接口前缀，校验端点挂在 `{api_prefix}/config`
    pub api_prefix: String,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// CORS允许的源，`*` 表示任意
    pub cors_origins: Vec<String>,
    /// 请求体大小上限（字节）
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            api_prefix: "/api".to_string(),
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            max_request_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// 监听地址字符串
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// 规范化后的接口前缀：空串表示挂载在根路径
    #[must_use]
    pub fn normalized_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }
}
