//! # Access Gate
//!
//! 多服务商聊天前端的访问码校验与凭据解析：
//!
//! - [`endpoint`]：以访问码换取作用域配置的 HTTP 端点
//! - [`client`]：凭据存储与授权状态机
//! - [`provider`]：出站认证头解析与服务商调度

pub mod access;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::AppConfig;
pub use error::{GateError, Result};
