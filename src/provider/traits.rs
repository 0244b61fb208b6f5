use async_trait::async_trait;
use bytes::Bytes;

use super::chat::{ChatOptions, LlmModel, LlmUsage, SpeechOptions};
use super::types::{ModelProvider, ServiceProvider};
use crate::error::Result;

/// 各服务商对话实现的统一契约
///
/// `chat` 的结果经由 [`ChatOptions::callbacks`] 交付：流式片段走 `on_update`，
/// 结束时恰好调用一次 `on_finish` 或 `on_error`。
#[async_trait]
pub trait LlmApi: Send + Sync + std::fmt::Debug {
    /// 实现所属的模型族
    fn model_provider(&self) -> ModelProvider;

    /// 凭据与认证头所属的服务商
    fn service_provider(&self) -> ServiceProvider;

    /// 流式对话；结果只经由 `options.callbacks` 送达，每次对话恰好结束一次
    async fn chat(&self, options: ChatOptions);

    /// 文本转语音，返回音频字节
    async fn speech(&self, options: SpeechOptions) -> Result<Bytes>;

    /// 账户用量与额度
    async fn usage(&self) -> Result<LlmUsage>;

    /// 可用模型列表
    async fn models(&self) -> Result<Vec<LlmModel>>;
}
