use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 凭据 / 认证头所属的服务商家族
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProvider {
    #[default]
    OpenAI,
    Azure,
    Google,
    Anthropic,
    Baidu,
    ByteDance,
    Alibaba,
    Tencent,
    Moonshot,
    Iflytek,
}

impl ServiceProvider {
    /// 全部服务商，顺序即授权判定的检查顺序
    pub const ALL: [Self; 10] = [
        Self::OpenAI,
        Self::Azure,
        Self::Google,
        Self::Anthropic,
        Self::Baidu,
        Self::ByteDance,
        Self::Alibaba,
        Self::Tencent,
        Self::Moonshot,
        Self::Iflytek,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Azure => "azure",
            Self::Google => "google",
            Self::Anthropic => "anthropic",
            Self::Baidu => "baidu",
            Self::ByteDance => "bytedance",
            Self::Alibaba => "alibaba",
            Self::Tencent => "tencent",
            Self::Moonshot => "moonshot",
            Self::Iflytek => "iflytek",
        }
    }

    fn normalize(input: &str) -> String {
        input
            .split(':')
            .next()
            .unwrap_or(input)
            .trim()
            .to_ascii_lowercase()
    }

    /// 严格解析：未知名称返回错误
    pub fn parse(name: &str) -> crate::error::Result<Self> {
        match Self::normalize(name).as_str() {
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            "azure" => Ok(Self::Azure),
            "google" | "gemini" => Ok(Self::Google),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "baidu" | "ernie" => Ok(Self::Baidu),
            "bytedance" | "doubao" => Ok(Self::ByteDance),
            "alibaba" | "qwen" => Ok(Self::Alibaba),
            "tencent" | "hunyuan" => Ok(Self::Tencent),
            "moonshot" => Ok(Self::Moonshot),
            "iflytek" | "spark" => Ok(Self::Iflytek),
            other => Err(GateError::validation(format!("unknown provider: {other}"))),
        }
    }

    /// 宽松解析：未知或缺失的名称回落到默认服务商
    #[must_use]
    pub fn parse_or_default(name: Option<&str>) -> Self {
        name.and_then(|n| Self::parse(n).ok()).unwrap_or_default()
    }

    /// 对应的调度实现
    #[must_use]
    pub const fn model_provider(self) -> ModelProvider {
        match self {
            Self::OpenAI | Self::Azure => ModelProvider::Gpt,
            Self::Google => ModelProvider::GeminiPro,
            Self::Anthropic => ModelProvider::Claude,
            Self::Baidu => ModelProvider::Ernie,
            Self::ByteDance => ModelProvider::Doubao,
            Self::Alibaba => ModelProvider::Qwen,
            Self::Tencent => ModelProvider::Hunyuan,
            Self::Moonshot => ModelProvider::Moonshot,
            Self::Iflytek => ModelProvider::Iflytek,
        }
    }
}

impl fmt::Display for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceProvider {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 对话实现家族（调度工厂的输入）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelProvider {
    #[default]
    Gpt,
    GeminiPro,
    Claude,
    Ernie,
    Doubao,
    Qwen,
    Hunyuan,
    Moonshot,
    Iflytek,
}

impl ModelProvider {
    /// 未显式指定服务商时使用的凭据家族
    #[must_use]
    pub const fn default_service(self) -> ServiceProvider {
        match self {
            Self::Gpt => ServiceProvider::OpenAI,
            Self::GeminiPro => ServiceProvider::Google,
            Self::Claude => ServiceProvider::Anthropic,
            Self::Ernie => ServiceProvider::Baidu,
            Self::Doubao => ServiceProvider::ByteDance,
            Self::Qwen => ServiceProvider::Alibaba,
            Self::Hunyuan => ServiceProvider::Tencent,
            Self::Moonshot => ServiceProvider::Moonshot,
            Self::Iflytek => ServiceProvider::Iflytek,
        }
    }
}
