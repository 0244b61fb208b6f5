//! # 访问码模块
//!
//! 服务端的访问码摘要、只读访问码表，以及校验端点返回的两种载荷：
//! 作用域配置 [`ScopedConfig`] 与公开配置 [`DangerConfig`]。

pub mod danger;
pub mod digest;
pub mod record;

pub use danger::DangerConfig;
pub use digest::{AccessCodeDigest, DigestAlgorithm};
pub use record::{AccessCodeRecord, AccessCodeTable, ScopedConfig};
