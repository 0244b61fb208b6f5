//! OpenAI 兼容协议的国内服务商（文心、豆包、通义、混元、Moonshot、星火）

use async_trait::async_trait;
use bytes::Bytes;

use super::{OPENAI_DECODING, Platform, PlatformContext, drive_chat, openai_chat_body};
use crate::error::Result;
use crate::provider::chat::{ChatOptions, LlmModel, LlmUsage, SpeechOptions};
use crate::provider::traits::LlmApi;
use crate::provider::types::{ModelProvider, ServiceProvider};

#[derive(Debug, Clone)]
pub struct CompatibleApi {
    model_provider: ModelProvider,
    platform: Platform,
}

impl CompatibleApi {
    #[must_use]
    pub fn new(model_provider: ModelProvider, ctx: PlatformContext) -> Self {
        let service = ctx.service_for(model_provider);
        Self {
            model_provider,
            platform: Platform::new(service, ctx),
        }
    }
}

#[async_trait]
impl LlmApi for CompatibleApi {
    fn model_provider(&self) -> ModelProvider {
        self.model_provider
    }

    fn service_provider(&self) -> ServiceProvider {
        self.platform.service()
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
            .endpoint(&creds, &self.platform.chat_path(&config.model))
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
            .json(&openai_chat_body(&messages, &config));
        drive_chat(&self.platform, request, config.stream, callbacks, OPENAI_DECODING).await;
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
            .model_table(&self.platform.snapshot(), &[self.platform.service()]))
    }
}
