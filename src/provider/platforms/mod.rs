//! # 服务商平台实现
//!
//! 每个平台只负责请求体的拼装与响应片段的提取；认证头、上游地址、
//! 流式读取与取消处理在这里统一完成。

mod anthropic;
mod compatible;
pub mod event_stream;
mod google;
mod openai;

pub use anthropic::ClaudeApi;
pub use compatible::CompatibleApi;
pub use google::GeminiProApi;
pub use openai::ChatGptApi;

use std::io;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value, json};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use super::chat::{ChatCallbacks, LlmConfig, LlmModel, RequestMessage};
use super::descriptor::{CredentialField, ProviderDescriptor, descriptor};
use super::headers::{HostContext, build_headers};
use super::models::collect_model_table;
use super::types::{ModelProvider, ServiceProvider};
use crate::client::{ClientCredentialState, CredentialStore};
use crate::error::{GateError, ProviderError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};
use event_stream::{SseDecoder, SseEvent};

/// 平台共享的运行环境
#[derive(Debug, Clone)]
pub struct PlatformContext {
    pub http: reqwest::Client,
    pub store: Arc<CredentialStore>,
    pub host: HostContext,
}

impl PlatformContext {
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, host: HostContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            store,
            host,
        }
    }

    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// 对话实现使用哪个服务商的凭据：当前服务商属于该实现时用它，否则用实现的默认服务商
    #[must_use]
    pub fn service_for(&self, model_provider: ModelProvider) -> ServiceProvider {
        let active = self.store.snapshot().active_provider;
        if active.model_provider() == model_provider {
            active
        } else {
            model_provider.default_service()
        }
    }
}

/// 单个平台实例持有的服务商与环境
#[derive(Debug, Clone)]
pub(crate) struct Platform {
    service: ServiceProvider,
    ctx: PlatformContext,
}

impl Platform {
    pub(crate) const fn new(service: ServiceProvider, ctx: PlatformContext) -> Self {
        Self { service, ctx }
    }

    pub(crate) const fn service(&self) -> ServiceProvider {
        self.service
    }

    pub(crate) fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor(self.service)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.ctx.http
    }

    pub(crate) fn snapshot(&self) -> ClientCredentialState {
        self.ctx.store.snapshot()
    }

    /// 用户配置的上游地址，未配置时使用默认地址
    pub(crate) fn base_url(&self, creds: &ClientCredentialState) -> Result<String> {
        let configured = creds.field(self.service, CredentialField::BaseUrl).trim();
        let base = if configured.is_empty() {
            self.descriptor().default_base_url
        } else {
            configured
        };
        if base.is_empty() {
            return Err(GateError::config(format!("{} 未配置上游地址", self.service)));
        }
        Ok(base.trim_end_matches('/').to_string())
    }

    pub(crate) fn endpoint(&self, creds: &ClientCredentialState, path: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url(creds)?, path))
    }

    pub(crate) fn chat_path(&self, model: &str) -> String {
        self.descriptor().chat_path.replace("{model}", model)
    }

    pub(crate) fn headers(&self, creds: &ClientCredentialState, ignore_headers: bool) -> Result<HeaderMap> {
        build_headers(self.service, creds, &self.ctx.host, ignore_headers)
    }

    /// 内置模型与用户 `customModels` 表达式合成的模型表
    pub(crate) fn model_table(
        &self,
        creds: &ClientCredentialState,
        services: &[ServiceProvider],
    ) -> Vec<LlmModel> {
        let defaults: Vec<(&str, ServiceProvider)> = services
            .iter()
            .flat_map(|&s| descriptor(s).default_models.iter().map(move |m| (*m, s)))
            .collect();
        collect_model_table(&defaults, &creds.custom_models, creds.flags.disable_gpt4)
    }

    pub(crate) fn unsupported(&self, feature: &str) -> GateError {
        ProviderError::unsupported(self.service.as_str(), feature).into()
    }

    /// 发送请求并检查状态码
    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(512).collect();
        lwarn!(
            "client",
            LogStage::Response,
            LogComponent::Platform,
            "upstream_status",
            format!("provider={} status={}", self.service, status.as_u16())
        );
        Err(ProviderError::ApiError {
            provider: self.service.as_str().to_string(),
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

/// 从响应中提取文本的方式
#[derive(Clone, Copy)]
pub(crate) struct ChatDecoding {
    /// 流式事件中的增量文本
    pub delta: fn(&SseEvent) -> Option<String>,
    /// 非流式响应体中的完整文本
    pub full: fn(&Value) -> Option<String>,
}

enum Step<T> {
    Aborted,
    Next(T),
}

/// 执行一次对话请求，并保证回调恰好结束一次
pub(crate) async fn drive_chat(
    platform: &Platform,
    request: reqwest::RequestBuilder,
    stream: bool,
    mut callbacks: ChatCallbacks,
    decoding: ChatDecoding,
) {
    let provider = platform.service().as_str();
    let token = callbacks.abort_handle();

    let response = tokio::select! {
        biased;
        () = token.cancelled() => Step::Aborted,
        response = platform.send(request) => Step::Next(response),
    };
    let response = match response {
        Step::Aborted => {
            ldebug!("client", LogStage::Response, LogComponent::Platform, "chat_aborted", provider);
            callbacks.finish(String::new());
            return;
        }
        Step::Next(Err(err)) => {
            callbacks.fail(err);
            return;
        }
        Step::Next(Ok(response)) => response,
    };

    if !stream {
        let body = tokio::select! {
            biased;
            () = token.cancelled() => Step::Aborted,
            body = response.json::<Value>() => Step::Next(body),
        };
        match body {
            Step::Aborted => callbacks.finish(String::new()),
            Step::Next(Err(err)) => callbacks.fail(err.into()),
            Step::Next(Ok(value)) => match (decoding.full)(&value) {
                Some(text) => {
                    callbacks.update(&text, &text);
                    callbacks.finish(text);
                }
                None => callbacks.fail(
                    ProviderError::InvalidResponse {
                        provider: provider.to_string(),
                        message: "response carries no message content".to_string(),
                    }
                    .into(),
                ),
            },
        }
        return;
    }

    let reader = StreamReader::new(response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)));
    let mut frames = Box::pin(FramedRead::new(reader, SseDecoder::new()));
    let mut message = String::new();

    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => Step::Aborted,
            next = frames.next() => Step::Next(next),
        };
        match next {
            Step::Aborted => {
                ldebug!(
                    "client",
                    LogStage::Response,
                    LogComponent::Platform,
                    "chat_aborted",
                    format!("provider={provider} partial_len={}", message.len())
                );
                break;
            }
            Step::Next(None) => break,
            Step::Next(Some(Err(err))) => {
                callbacks.fail(
                    ProviderError::Stream {
                        provider: provider.to_string(),
                        message: err.to_string(),
                    }
                    .into(),
                );
                return;
            }
            Step::Next(Some(Ok(event))) => {
                if event.is_done() {
                    break;
                }
                if let Some(chunk) = (decoding.delta)(&event).filter(|c| !c.is_empty()) {
                    message.push_str(&chunk);
                    callbacks.update(&message, &chunk);
                }
            }
        }
    }

    callbacks.finish(message);
}

/// OpenAI 兼容的消息体
pub(crate) fn openai_chat_body(messages: &[RequestMessage], config: &LlmConfig) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(config.model));
    body.insert(
        "messages".into(),
        Value::Array(
            messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect(),
        ),
    );
    body.insert("stream".into(), json!(config.stream));
    insert_opt(&mut body, "temperature", config.temperature);
    insert_opt(&mut body, "top_p", config.top_p);
    insert_opt(&mut body, "max_tokens", config.max_tokens);
    insert_opt(&mut body, "presence_penalty", config.presence_penalty);
    insert_opt(&mut body, "frequency_penalty", config.frequency_penalty);
    Value::Object(body)
}

pub(crate) fn insert_opt<T: serde::Serialize>(body: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        body.insert(key.to_string(), json!(value));
    }
}

/// OpenAI 兼容流式事件中的增量文本
pub(crate) fn openai_delta(event: &SseEvent) -> Option<String> {
    event.json()?["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

pub(crate) fn openai_full(value: &Value) -> Option<String> {
    value["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}

pub(crate) const OPENAI_DECODING: ChatDecoding = ChatDecoding {
    delta: openai_delta,
    full: openai_full,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::chat::MessageRole;

    #[test]
    fn openai_body_skips_unset_parameters() {
        let body = openai_chat_body(
            &[RequestMessage::new(MessageRole::User, "hi")],
            &LlmConfig::model("gpt-4o").streaming(true),
        );
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn openai_delta_reads_choice_content() {
        let event = SseEvent {
            event: None,
            data: r#"{"choices":[{"delta":{"content":"He"}}]}"#.into(),
        };
        assert_eq!(openai_delta(&event).as_deref(), Some("He"));
    }

    #[test]
    fn service_follows_active_provider_within_family() {
        let mut state = ClientCredentialState::default();
        state.active_provider = ServiceProvider::Azure;
        let ctx = PlatformContext::new(
            Arc::new(CredentialStore::in_memory(state)),
            HostContext::default(),
        );
        assert_eq!(ctx.service_for(ModelProvider::Gpt), ServiceProvider::Azure);
        assert_eq!(ctx.service_for(ModelProvider::Claude), ServiceProvider::Anthropic);
    }
}
