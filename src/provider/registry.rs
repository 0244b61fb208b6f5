//! # 服务商调度工厂
//!
//! 封闭的 [`ModelProvider`] 枚举到 [`LlmApi`] 实现的全映射，不做任何 I/O。

use std::sync::Arc;

use super::platforms::{ChatGptApi, ClaudeApi, CompatibleApi, GeminiProApi, PlatformContext};
use super::traits::LlmApi;
use super::types::{ModelProvider, ServiceProvider};
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 调用方持有的对话客户端
#[derive(Debug, Clone)]
pub struct ClientApi {
    pub llm: Arc<dyn LlmApi>,
}

impl ClientApi {
    #[must_use]
    pub fn new(provider: ModelProvider, ctx: PlatformContext) -> Self {
        let llm: Arc<dyn LlmApi> = match provider {
            ModelProvider::Gpt => Arc::new(ChatGptApi::new(ctx)),
            ModelProvider::GeminiPro => Arc::new(GeminiProApi::new(ctx)),
            ModelProvider::Claude => Arc::new(ClaudeApi::new(ctx)),
            ModelProvider::Ernie
            | ModelProvider::Doubao
            | ModelProvider::Qwen
            | ModelProvider::Hunyuan
            | ModelProvider::Moonshot
            | ModelProvider::Iflytek => Arc::new(CompatibleApi::new(provider, ctx)),
        };

        ldebug!(
            "client",
            LogStage::Configuration,
            LogComponent::ProviderFactory,
            "create_client",
            format!("model_provider={provider:?} service={}", llm.service_provider())
        );
        Self { llm }
    }
}

/// 按服务商构造客户端：Azure 归入 GPT 实现并使用 Azure 凭据
#[must_use]
pub fn get_client_api(provider: ServiceProvider, ctx: PlatformContext) -> ClientApi {
    match provider {
        ServiceProvider::Azure | ServiceProvider::OpenAI => {
            let llm: Arc<dyn LlmApi> = Arc::new(ChatGptApi::for_service(provider, ctx));
            ClientApi { llm }
        }
        other => ClientApi::new(other.model_provider(), ctx),
    }
}

/// 按名称构造客户端；未知或缺失的名称回落到 OpenAI
#[must_use]
pub fn get_client_api_by_name(name: Option<&str>, ctx: PlatformContext) -> ClientApi {
    get_client_api(ServiceProvider::parse_or_default(name), ctx)
}
