//! Types of the uniform chat contract shared by every vendor platform.

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

use super::types::ServiceProvider;

/// Handle handed to the caller so an in-flight response can be aborted.
pub type AbortHandle = CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: MessageRole,
    pub content: String,
}

impl RequestMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Generation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(default)]
    pub stream: bool,
}

impl LlmConfig {
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub model: String,
    pub input: String,
    pub voice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub used: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub available: bool,
    pub provider: ServiceProvider,
}

type UpdateFn = Box<dyn FnMut(&str, &str) + Send>;
type FinishFn = Box<dyn FnOnce(String) + Send>;
type ErrorFn = Box<dyn FnOnce(GateError) + Send>;
type AbortFn = Box<dyn FnOnce(AbortHandle) + Send>;

/// Callbacks of one chat exchange.
///
/// `finish` and `fail` consume the value, so a response ends exactly once.
pub struct ChatCallbacks {
    on_update: Option<UpdateFn>,
    on_finish: FinishFn,
    on_error: Option<ErrorFn>,
    on_abort_handle: Option<AbortFn>,
}

impl ChatCallbacks {
    pub fn new(on_finish: impl FnOnce(String) + Send + 'static) -> Self {
        Self {
            on_update: None,
            on_finish: Box::new(on_finish),
            on_error: None,
            on_abort_handle: None,
        }
    }

    /// Called with `(full_message_so_far, latest_chunk)`.
    #[must_use]
    pub fn on_update(mut self, f: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(GateError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_abort_handle(mut self, f: impl FnOnce(AbortHandle) + Send + 'static) -> Self {
        self.on_abort_handle = Some(Box::new(f));
        self
    }

    /// Creates the abort handle of this exchange and hands a clone to the caller.
    pub(crate) fn abort_handle(&mut self) -> AbortHandle {
        let token = CancellationToken::new();
        if let Some(f) = self.on_abort_handle.take() {
            f(token.clone());
        }
        token
    }

    pub(crate) fn update(&mut self, message: &str, chunk: &str) {
        if let Some(f) = self.on_update.as_mut() {
            f(message, chunk);
        }
    }

    pub(crate) fn finish(self, message: String) {
        (self.on_finish)(message);
    }

    pub(crate) fn fail(self, error: GateError) {
        match self.on_error {
            Some(f) => f(error),
            None => tracing::warn!(error = %error, "chat failed without an error callback"),
        }
    }
}

impl fmt::Debug for ChatCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCallbacks")
            .field("on_update", &self.on_update.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_abort_handle", &self.on_abort_handle.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ChatOptions {
    pub messages: Vec<RequestMessage>,
    pub config: LlmConfig,
    pub callbacks: ChatCallbacks,
}
