//! OpenAI 与 Azure OpenAI

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{OPENAI_DECODING, Platform, PlatformContext, drive_chat, openai_chat_body};
use crate::client::ClientCredentialState;
use crate::error::Result;
use crate::provider::chat::{ChatOptions, LlmModel, LlmUsage, SpeechOptions};
use crate::provider::descriptor::CredentialField;
use crate::provider::models::collect_model_table;
use crate::provider::traits::LlmApi;
use crate::provider::types::{ModelProvider, ServiceProvider};

const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

#[derive(Debug, Clone)]
pub struct ChatGptApi {
    platform: Platform,
}

/// `total_usage` 以美分计
#[derive(Debug, Deserialize)]
struct BillingUsage {
    #[serde(default)]
    total_usage: f64,
}

#[derive(Debug, Deserialize)]
struct BillingSubscription {
    #[serde(default)]
    hard_limit_usd: f64,
}

#[derive(Debug, Deserialize)]
struct RemoteModelList {
    #[serde(default)]
    data: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    id: String,
}

impl ChatGptApi {
    #[must_use]
    pub fn new(ctx: PlatformContext) -> Self {
        let service = ctx.service_for(ModelProvider::Gpt);
        Self::for_service(service, ctx)
    }

    /// 指定使用 OpenAI 或 Azure 凭据
    #[must_use]
    pub fn for_service(service: ServiceProvider, ctx: PlatformContext) -> Self {
        Self {
            platform: Platform::new(service, ctx),
        }
    }

    const fn is_azure(&self) -> bool {
        matches!(self.platform.service(), ServiceProvider::Azure)
    }

    fn azure_version(creds: &ClientCredentialState) -> String {
        let version = creds
            .field(ServiceProvider::Azure, CredentialField::ApiVersion)
            .trim();
        if version.is_empty() {
            DEFAULT_AZURE_API_VERSION.to_string()
        } else {
            version.to_string()
        }
    }

    /// Azure 路径按部署名拼接，并附带 `api-version`
    fn url_for(&self, creds: &ClientCredentialState, path: &str) -> Result<String> {
        let url = self.platform.endpoint(creds, path)?;
        if self.is_azure() {
            Ok(format!("{url}?api-version={}", Self::azure_version(creds)))
        } else {
            Ok(url)
        }
    }

    /// 拉取远端模型列表，并应用用户的 `customModels` 表达式
    pub async fn remote_models(&self) -> Result<Vec<LlmModel>> {
        if self.is_azure() {
            return Ok(self.local_models());
        }
        let creds = self.platform.snapshot();
        let url = self.platform.endpoint(&creds, "/v1/models")?;
        let request = self
            .platform
            .http()
            .get(url)
            .headers(self.platform.headers(&creds, false)?);
        let list: RemoteModelList = self.platform.send(request).await?.json().await?;

        let mut names: Vec<String> = list
            .data
            .into_iter()
            .map(|m| m.id)
            .filter(|id| id.starts_with("gpt-") || id.starts_with("chatgpt-"))
            .collect();
        names.sort();
        let defaults: Vec<(&str, ServiceProvider)> = names
            .iter()
            .map(|n| (n.as_str(), ServiceProvider::OpenAI))
            .collect();
        Ok(collect_model_table(
            &defaults,
            &creds.custom_models,
            creds.flags.disable_gpt4,
        ))
    }

    fn local_models(&self) -> Vec<LlmModel> {
        self.platform.model_table(
            &self.platform.snapshot(),
            &[ServiceProvider::OpenAI, ServiceProvider::Azure],
        )
    }
}

#[async_trait]
impl LlmApi for ChatGptApi {
    fn model_provider(&self) -> ModelProvider {
        ModelProvider::Gpt
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
            .url_for(&creds, &self.platform.chat_path(&config.model))
            .and_then(|url| Ok((url, self.platform.headers(&creds, false)?)));
        let (url, headers) = match prepared {
            Ok(parts) => parts,
            Err(err) => return callbacks.fail(err),
        };

        let body = openai_chat_body(&messages, &config);
        let request = self.platform.http().post(url).headers(headers).json(&body);
        drive_chat(&self.platform, request, config.stream, callbacks, OPENAI_DECODING).await;
    }

    async fn speech(&self, options: SpeechOptions) -> Result<Bytes> {
        let creds = self.platform.snapshot();
        let path = if self.is_azure() {
            format!("/openai/deployments/{}/audio/speech", options.model)
        } else {
            "/v1/audio/speech".to_string()
        };
        let url = self.url_for(&creds, &path)?;
        let request = self
            .platform
            .http()
            .post(url)
            .headers(self.platform.headers(&creds, false)?)
            .json(&options);
        Ok(self.platform.send(request).await?.bytes().await?)
    }

    async fn usage(&self) -> Result<LlmUsage> {
        let creds = self.platform.snapshot();
        if self.is_azure() || creds.flags.hide_balance_query {
            return Ok(LlmUsage::default());
        }

        let today = Utc::now().date_naive();
        let start = (today - Duration::days(90)).format("%Y-%m-%d");
        let end = (today + Duration::days(1)).format("%Y-%m-%d");
        let headers = self.platform.headers(&creds, false)?;

        let usage_url = self.platform.endpoint(
            &creds,
            &format!("/dashboard/billing/usage?start_date={start}&end_date={end}"),
        )?;
        let usage: BillingUsage = self
            .platform
            .send(self.platform.http().get(usage_url).headers(headers.clone()))
            .await?
            .json()
            .await?;

        let subscription_url = self
            .platform
            .endpoint(&creds, "/dashboard/billing/subscription")?;
        let subscription: BillingSubscription = self
            .platform
            .send(self.platform.http().get(subscription_url).headers(headers))
            .await?
            .json()
            .await?;

        Ok(LlmUsage {
            used: usage.total_usage.round() / 100.0,
            total: subscription.hard_limit_usd,
        })
    }

    async fn models(&self) -> Result<Vec<LlmModel>> {
        Ok(self.local_models())
    }
}
