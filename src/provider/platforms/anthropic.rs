use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::{Map, Value, json};

use super::event_stream::SseEvent;
use super::{ChatDecoding, Platform, PlatformContext, drive_chat, insert_opt};
use crate::error::{GateError, Result};
use crate::provider::chat::{ChatOptions, LlmConfig, LlmModel, LlmUsage, MessageRole, RequestMessage, SpeechOptions};
use crate::provider::descriptor::CredentialField;
use crate::provider::traits::LlmApi;
use crate::provider::types::{ModelProvider, ServiceProvider};

const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic messages API
#[derive(Debug, Clone)]
pub struct ClaudeApi {
    platform: Platform,
}

impl ClaudeApi {
    #[must_use]
    pub fn new(ctx: PlatformContext) -> Self {
        Self {
            platform: Platform::new(ServiceProvider::Anthropic, ctx),
        }
    }
}

/// system 消息单独放入 `system` 字段，其余按原顺序作为对话轮次
fn messages_body(messages: &[RequestMessage], config: &LlmConfig) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let turns: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    let mut body = Map::new();
    body.insert("model".into(), json!(config.model));
    body.insert("messages".into(), Value::Array(turns));
    body.insert(
        "max_tokens".into(),
        json!(config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    body.insert("stream".into(), json!(config.stream));
    if !system.is_empty() {
        body.insert("system".into(), json!(system.join("\n")));
    }
    insert_opt(&mut body, "temperature", config.temperature);
    insert_opt(&mut body, "top_p", config.top_p);
    Value::Object(body)
}

fn claude_delta(event: &SseEvent) -> Option<String> {
    let value = event.json()?;
    if value["type"] != "content_block_delta" {
        return None;
    }
    value["delta"]["text"].as_str().map(str::to_string)
}

fn claude_full(value: &Value) -> Option<String> {
    let blocks = value["content"].as_array()?;
    Some(
        blocks
            .iter()
            .filter_map(|b| b["text"].as_str())
            .collect::<String>(),
    )
}

const CLAUDE_DECODING: ChatDecoding = ChatDecoding {
    delta: claude_delta,
    full: claude_full,
};

#[async_trait]
impl LlmApi for ClaudeApi {
    fn model_provider(&self) -> ModelProvider {
        ModelProvider::Claude
    }

    fn service_provider(&self) -> ServiceProvider {
        ServiceProvider::Anthropic
    }

    async fn chat(&self, options: ChatOptions) {
        let ChatOptions {
            messages,
            config,
            callbacks,
        } = options;
        let creds = self.platform.snapshot();

        let prepared = (|| -> Result<_> {
            let url = self.platform.endpoint(&creds, &self.platform.chat_path(&config.model))?;
            let mut headers = self.platform.headers(&creds, false)?;
            let version = creds
                .field(ServiceProvider::Anthropic, CredentialField::ApiVersion)
                .trim();
            let version = if version.is_empty() {
                DEFAULT_ANTHROPIC_VERSION
            } else {
                version
            };
            headers.insert(
                HeaderName::from_static("anthropic-version"),
                HeaderValue::from_str(version)
                    .map_err(|e| GateError::validation_with_source("invalid anthropic version", e))?,
            );
            Ok((url, headers))
        })();
        let (url, headers) = match prepared {
            Ok(parts) => parts,
            Err(err) => return callbacks.fail(err),
        };

        let request = self
            .platform
            .http()
            .post(url)
            .headers(headers)
            .json(&messages_body(&messages, &config));
        drive_chat(&self.platform, request, config.stream, callbacks, CLAUDE_DECODING).await;
    }

    async fn speech(&self, _options: SpeechOptions) -> Result<Bytes> {
        Err(self.platform.unsupported("speech"))
    }

    async fn usage(&self) -> Result<LlmUsage> {
        Ok(LlmUsage::default())
    }

    async fn models(&self) -> Result<Vec<LlmModel>> {
        Ok(self
            .platform
            .model_table(&self.platform.snapshot(), &[ServiceProvider::Anthropic]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_is_lifted_out_of_turns() {
        let body = messages_body(
            &[
                RequestMessage::system("be brief"),
                RequestMessage::user("hi"),
            ],
            &LlmConfig::model("claude-3-haiku-20240307"),
        );
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn only_content_deltas_produce_text() {
        let delta = SseEvent {
            event: Some("content_block_delta".into()),
            data: r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":"Hi"}}"#.into(),
        };
        let ping = SseEvent {
            event: Some("ping".into()),
            data: r#"{"type":"ping"}"#.into(),
        };
        assert_eq!(claude_delta(&delta).as_deref(), Some("Hi"));
        assert!(claude_delta(&ping).is_none());
    }

    #[test]
    fn full_response_concatenates_text_blocks() {
        let value = json!({"content": [{"type":"text","text":"a"},{"type":"text","text":"b"}]});
        assert_eq!(claude_full(&value).as_deref(), Some("ab"));
    }
}
