//! 服务商静态描述表
//!
//! 每个服务商家族一条记录：认证头名称、凭据字段键、授权所需字段、
//! 默认上游地址与对话路径，以及内置模型列表。

use super::types::{ModelProvider, ServiceProvider};

/// 默认认证头
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// 判断某服务商凭据是否完整所需的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    ApiKey,
    ApiSecret,
    BaseUrl,
    ApiVersion,
}

/// 服务商描述
#[derive(Debug)]
pub struct ProviderDescriptor {
    pub id: ServiceProvider,
    /// 直接密钥使用的认证头名称
    pub auth_header_name: &'static str,
    /// 凭据存储中 API Key 的字段键
    pub credential_field_key: &'static str,
    pub secret_field_key: Option<&'static str>,
    pub base_url_field_key: &'static str,
    pub version_field_key: Option<&'static str>,
    pub required_fields: &'static [CredentialField],
    pub default_base_url: &'static str,
    /// 对话路径，`{model}` 为模型占位符
    pub chat_path: &'static str,
    pub model_provider: ModelProvider,
    pub default_models: &'static [&'static str],
}

impl ProviderDescriptor {
    /// 是否使用 `Authorization: Bearer` 方案
    #[must_use]
    pub fn uses_bearer(&self) -> bool {
        self.auth_header_name == AUTHORIZATION_HEADER
    }
}

const KEY_ONLY: &[CredentialField] = &[CredentialField::ApiKey];
const KEY_AND_SECRET: &[CredentialField] = &[CredentialField::ApiKey, CredentialField::ApiSecret];

static DESCRIPTORS: [ProviderDescriptor; 10] = [
    ProviderDescriptor {
        id: ServiceProvider::OpenAI,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "openaiApiKey",
        secret_field_key: None,
        base_url_field_key: "openaiUrl",
        version_field_key: None,
        required_fields: KEY_ONLY,
        default_base_url: "https://api.openai.com",
        chat_path: "/v1/chat/completions",
        model_provider: ModelProvider::Gpt,
        default_models: &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Azure,
        auth_header_name: "api-key",
        credential_field_key: "azureApiKey",
        secret_field_key: None,
        base_url_field_key: "azureUrl",
        version_field_key: Some("azureApiVersion"),
        required_fields: &[
            CredentialField::BaseUrl,
            CredentialField::ApiKey,
            CredentialField::ApiVersion,
        ],
        default_base_url: "",
        chat_path: "/openai/deployments/{model}/chat/completions",
        model_provider: ModelProvider::Gpt,
        default_models: &["gpt-4o", "gpt-4", "gpt-35-turbo"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Google,
        auth_header_name: "x-goog-api-key",
        credential_field_key: "googleApiKey",
        secret_field_key: None,
        base_url_field_key: "googleUrl",
        version_field_key: Some("googleApiVersion"),
        required_fields: KEY_ONLY,
        default_base_url: "https://generativelanguage.googleapis.com",
        chat_path: "/v1beta/models/{model}:generateContent",
        model_provider: ModelProvider::GeminiPro,
        default_models: &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-pro"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Anthropic,
        auth_header_name: "x-api-key",
        credential_field_key: "anthropicApiKey",
        secret_field_key: None,
        base_url_field_key: "anthropicUrl",
        version_field_key: Some("anthropicApiVersion"),
        required_fields: KEY_ONLY,
        default_base_url: "https://api.anthropic.com",
        chat_path: "/v1/messages",
        model_provider: ModelProvider::Claude,
        default_models: &[
            "claude-3-5-sonnet-20240620",
            "claude-3-opus-20240229",
            "claude-3-haiku-20240307",
        ],
    },
    ProviderDescriptor {
        id: ServiceProvider::Baidu,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "baiduApiKey",
        secret_field_key: Some("baiduSecretKey"),
        base_url_field_key: "baiduUrl",
        version_field_key: None,
        required_fields: KEY_AND_SECRET,
        default_base_url: "https://qianfan.baidubce.com",
        chat_path: "/v2/chat/completions",
        model_provider: ModelProvider::Ernie,
        default_models: &["ernie-4.0-8k", "ernie-3.5-8k", "ernie-speed-128k"],
    },
    ProviderDescriptor {
        id: ServiceProvider::ByteDance,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "bytedanceApiKey",
        secret_field_key: None,
        base_url_field_key: "bytedanceUrl",
        version_field_key: None,
        required_fields: KEY_ONLY,
        default_base_url: "https://ark.cn-beijing.volces.com",
        chat_path: "/api/v3/chat/completions",
        model_provider: ModelProvider::Doubao,
        default_models: &["doubao-pro-32k", "doubao-lite-32k"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Alibaba,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "alibabaApiKey",
        secret_field_key: None,
        base_url_field_key: "alibabaUrl",
        version_field_key: None,
        required_fields: KEY_ONLY,
        default_base_url: "https://dashscope.aliyuncs.com",
        chat_path: "/compatible-mode/v1/chat/completions",
        model_provider: ModelProvider::Qwen,
        default_models: &["qwen-turbo", "qwen-plus", "qwen-max"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Tencent,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "tencentSecretId",
        secret_field_key: Some("tencentSecretKey"),
        base_url_field_key: "tencentUrl",
        version_field_key: None,
        required_fields: KEY_AND_SECRET,
        default_base_url: "https://api.hunyuan.cloud.tencent.com",
        chat_path: "/v1/chat/completions",
        model_provider: ModelProvider::Hunyuan,
        default_models: &["hunyuan-pro", "hunyuan-standard", "hunyuan-lite"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Moonshot,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "moonshotApiKey",
        secret_field_key: None,
        base_url_field_key: "moonshotUrl",
        version_field_key: None,
        required_fields: KEY_ONLY,
        default_base_url: "https://api.moonshot.cn",
        chat_path: "/v1/chat/completions",
        model_provider: ModelProvider::Moonshot,
        default_models: &["moonshot-v1-8k", "moonshot-v1-32k", "moonshot-v1-128k"],
    },
    ProviderDescriptor {
        id: ServiceProvider::Iflytek,
        auth_header_name: AUTHORIZATION_HEADER,
        credential_field_key: "iflytekApiKey",
        secret_field_key: Some("iflytekApiSecret"),
        base_url_field_key: "iflytekUrl",
        version_field_key: None,
        required_fields: KEY_AND_SECRET,
        default_base_url: "https://spark-api-open.xf-yun.com",
        chat_path: "/v1/chat/completions",
        model_provider: ModelProvider::Iflytek,
        default_models: &["general", "generalv3", "generalv3.5", "4.0Ultra"],
    },
];

/// 查询服务商描述
#[must_use]
pub fn descriptor(provider: ServiceProvider) -> &'static ProviderDescriptor {
    &DESCRIPTORS[provider as usize]
}

/// 全部描述，顺序与 [`ServiceProvider::ALL`] 一致
#[must_use]
pub fn descriptors() -> &'static [ProviderDescriptor] {
    &DESCRIPTORS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_aligned_with_enum() {
        for provider in ServiceProvider::ALL {
            assert_eq!(descriptor(provider).id, provider);
        }
        assert_eq!(descriptors().len(), ServiceProvider::ALL.len());
    }

    #[test]
    fn only_three_families_use_custom_headers() {
        let custom: Vec<_> = descriptors()
            .iter()
            .filter(|d| !d.uses_bearer())
            .map(|d| (d.id, d.auth_header_name))
            .collect();
        assert_eq!(
            custom,
            vec![
                (ServiceProvider::Azure, "api-key"),
                (ServiceProvider::Google, "x-goog-api-key"),
                (ServiceProvider::Anthropic, "x-api-key"),
            ]
        );
    }

    #[test]
    fn field_keys_are_unique() {
        let mut keys: Vec<&str> = descriptors()
            .iter()
            .flat_map(|d| {
                [Some(d.credential_field_key), d.secret_field_key, Some(d.base_url_field_key), d.version_field_key]
            })
            .flatten()
            .collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }
}
