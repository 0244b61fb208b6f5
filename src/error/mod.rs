//! # 错误处理
//!
//! - [`GateError`]：全局错误类型，每个变体带消息与可选来源
//! - [`AccessError`]：校验端点的失败结果，映射为固定的状态码与公开消息
//! - [`ProviderError`]：服务商调用失败
//!
//! 跨层传递时用 [`Context`] 追加上下文。

use std::fmt::Display;

pub mod access;
pub mod macros;
pub mod provider;
pub mod types;

pub use access::AccessError;
pub use provider::ProviderError;
pub use types::GateError;

pub type Result<T> = std::result::Result<T, GateError>;

/// 为任意可转换为 [`GateError`] 的结果追加上下文
pub trait Context<T> {
    #[track_caller]
    fn context<C: Display>(self, context: C) -> Result<T>;

    #[track_caller]
    fn with_context<C: Display, F: FnOnce() -> C>(self, context: F) -> Result<T>;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<GateError>,
{
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.with_context(|| context)
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, context: F) -> Result<T> {
        self.map_err(|error| GateError::Context {
            context: context().to_string(),
            source: Box::new(error.into()),
        })
    }
}

/// 错误归属：4xx 为客户端，其余为服务端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Client,
    Server,
}

#[cfg(test)]
mod tests;
