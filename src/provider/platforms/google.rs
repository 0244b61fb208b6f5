use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value, json};

use super::event_stream::SseEvent;
use super::{ChatDecoding, Platform, PlatformContext, drive_chat, insert_opt};
use crate::error::Result;
use crate::provider::chat::{ChatOptions, LlmConfig, LlmModel, LlmUsage, MessageRole, RequestMessage, SpeechOptions};
use crate::provider::traits::LlmApi;
use crate::provider::types::{ModelProvider, ServiceProvider};

/// Google Gemini generateContent API
#[derive(Debug, Clone)]
pub struct GeminiProApi {
    platform: Platform,
}

impl GeminiProApi {
    #[must_use]
    pub fn new(ctx: PlatformContext) -> Self {
        Self {
            platform: Platform::new(ServiceProvider::Google, ctx),
        }
    }

    /// 流式请求改用 `streamGenerateContent` 并要求 SSE 输出
    fn path(&self, model: &str, stream: bool) -> String {
        let path = self.platform.chat_path(model);
        if stream {
            format!(
                "{}?alt=sse",
                path.replace(":generateContent", ":streamGenerateContent")
            )
        } else {
            path
        }
    }
}

fn contents_body(messages: &[RequestMessage], config: &LlmConfig) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let role = if m.role == MessageRole::Assistant {
                "model"
            } else {
                "user"
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut generation = Map::new();
    insert_opt(&mut generation, "temperature", config.temperature);
    insert_opt(&mut generation, "topP", config.top_p);
    insert_opt(&mut generation, "maxOutputTokens", config.max_tokens);

    let mut body = Map::new();
    body.insert("contents".into(), Value::Array(contents));
    if !system.is_empty() {
        body.insert(
            "systemInstruction".into(),
            json!({ "parts": [{ "text": system.join("\n") }] }),
        );
    }
    if !generation.is_empty() {
        body.insert("generationConfig".into(), Value::Object(generation));
    }
    Value::Object(body)
}

fn candidate_text(value: &Value) -> Option<String> {
    let parts = value["candidates"][0]["content"]["parts"].as_array()?;
    Some(parts.iter().filter_map(|p| p["text"].as_str()).collect())
}

fn gemini_delta(event: &SseEvent) -> Option<String> {
    candidate_text(&event.json()?)
}

const GEMINI_DECODING: ChatDecoding = ChatDecoding {
    delta: gemini_delta,
    full: candidate_text,
};

#[async_trait]
impl LlmApi for GeminiProApi {
    fn model_provider(&self) -> ModelProvider {
        ModelProvider::GeminiPro
    }

    fn service_provider(&self) -> ServiceProvider {
        ServiceProvider::Google
    }

    async fn chat(&self, options: ChatOptions) {
        let ChatOptions {
            messages,
            config,
            callbacks,
        } = options;
        let creds = self.platform.snapshot();

        let prepared = self
            .platform
            .endpoint(&creds, &self.path(&config.model, config.stream))
            .and_then(|url| Ok((url, self.platform.headers(&creds, false)?)));
        let (url, headers) = match prepared {
            Ok(parts) => parts,
            Err(err) => return callbacks.fail(err),
        };

        let request = self
            .platform
            .http()
            .post(url)
            .headers(headers)
            .json(&contents_body(&messages, &config));
        drive_chat(&self.platform, request, config.stream, callbacks, GEMINI_DECODING).await;
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
            .model_table(&self.platform.snapshot(), &[ServiceProvider::Google]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_turns_use_model_role() {
        let body = contents_body(
            &[
                RequestMessage::system("sys"),
                RequestMessage::user("hi"),
                RequestMessage::new(MessageRole::Assistant, "hello"),
            ],
            &LlmConfig::model("gemini-pro"),
        );
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn candidate_parts_are_joined() {
        let value = json!({"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]});
        assert_eq!(candidate_text(&value).as_deref(), Some("ab"));
    }
}
