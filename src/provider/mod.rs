//! Provider capability module。
//!
//! - `types`：服务商 / 对话实现的封闭枚举
//! - `descriptor`：每个服务商的静态描述（认证头、凭据字段、默认地址）
//! - `headers`：出站认证头解析
//! - `chat`/`traits`：统一的对话契约
//! - `platforms`：各服务商的实现
//! - `registry`：调度工厂
//! - `models`：模型表合成

pub mod chat;
pub mod descriptor;
pub mod headers;
pub mod models;
pub mod platforms;
mod registry;
mod traits;
pub mod types;

pub use chat::{
    AbortHandle, ChatCallbacks, ChatOptions, LlmConfig, LlmModel, LlmUsage, MessageRole,
    RequestMessage, SpeechOptions,
};
pub use descriptor::{ProviderDescriptor, descriptor};
pub use headers::{ACCESS_CODE_PREFIX, AuthHeader, HostContext, build_headers, resolve_auth_header};
pub use platforms::PlatformContext;
pub use registry::{ClientApi, get_client_api, get_client_api_by_name};
pub use traits::LlmApi;
pub use types::{ModelProvider, ServiceProvider};
