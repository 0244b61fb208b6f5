//! # 访问控制配置
//!
//! `[access]` 段：功能开关、全局模型默认值，以及 `[[access.codes]]` 访问码条目。
//! 条目可以写明文 `code`（启动时计算摘要后丢弃）或预先计算好的 `digest`。

use crate::access::{AccessCodeDigest, DigestAlgorithm};
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 访问控制配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// 是否要求访问码；未设置时取决于访问码表是否为空
    pub need_code: Option<bool>,
    /// 校验成功时是否隐藏 `apiKey`
    pub hide_user_api_key: bool,
    pub disable_gpt4: bool,
    pub hide_balance_query: bool,
    pub disable_fast_link: bool,
    /// 全局模型表表达式
    pub custom_models: String,
    pub default_model: String,
    /// 访问码摘要算法
    pub digest: DigestAlgorithm,
    pub codes: Vec<AccessCodeEntry>,
}

impl AccessConfig {
    /// 是否启用访问控制
    #[must_use]
    pub fn need_code(&self, table_len: usize) -> bool {
        self.need_code.unwrap_or(table_len > 0)
    }
}

/// 访问码条目
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessCodeEntry {
    /// 明文访问码（不会被序列化输出）
    #[serde(skip_serializing)]
    pub code: Option<String>,
    /// 预先计算的十六进制摘要
    pub digest: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub custom_models: String,
    pub default_model: String,
}

impl AccessCodeEntry {
    /// 以明文访问码构造条目
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// 计算或解析条目的摘要；`code` 与 `digest` 必须恰好出现一个
    pub fn resolve_digest(&self, algorithm: DigestAlgorithm) -> Result<AccessCodeDigest> {
        match (self.code.as_deref(), self.digest.as_deref()) {
            (Some(_), Some(_)) => Err(GateError::config("code 与 digest 不能同时配置")),
            (None, None) => Err(GateError::config("必须配置 code 或 digest 之一")),
            (Some(code), None) if code.is_empty() => Err(GateError::config("访问码不能为空")),
            (Some(code), None) => Ok(algorithm.digest(code)),
            (None, Some(digest)) => algorithm.parse_digest(digest),
        }
    }
}

impl fmt::Debug for AccessCodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCodeEntry")
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .field("digest", &self.digest)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("custom_models", &self.custom_models)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn need_code_defaults_to_table_presence() {
        let mut access = AccessConfig::default();
        assert!(!access.need_code(0));
        assert!(access.need_code(2));

        access.need_code = Some(false);
        assert!(!access.need_code(2));
        access.need_code = Some(true);
        assert!(access.need_code(0));
    }

    #[test]
    fn entry_requires_exactly_one_of_code_and_digest() {
        let both = AccessCodeEntry {
            code: Some("ABCD".into()),
            digest: Some("cb08ca4a7bb5f9683c19133a84872ca7".into()),
            ..AccessCodeEntry::default()
        };
        assert!(both.resolve_digest(DigestAlgorithm::Md5).is_err());
        assert!(
            AccessCodeEntry::default()
                .resolve_digest(DigestAlgorithm::Md5)
                .is_err()
        );
        assert!(
            AccessCodeEntry::with_code("")
                .resolve_digest(DigestAlgorithm::Md5)
                .is_err()
        );
    }

    #[test]
    fn plaintext_and_precomputed_digest_agree() {
        let from_code = AccessCodeEntry::with_code("1234")
            .resolve_digest(DigestAlgorithm::Md5)
            .unwrap();
        let from_digest = AccessCodeEntry {
            digest: Some("81dc9bdb52d04dc20036dbd8313ed055".into()),
            ..AccessCodeEntry::default()
        }
        .resolve_digest(DigestAlgorithm::Md5)
        .unwrap();
        assert_eq!(from_code, from_digest);
    }

    #[test]
    fn debug_and_serialisation_hide_plaintext() {
        let entry = AccessCodeEntry {
            code: Some("super-secret".into()),
            api_key: "sk-live".into(),
            ..AccessCodeEntry::default()
        };
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("sk-live"));

        let toml = toml::to_string(&entry).unwrap();
        assert!(!toml.contains("super-secret"));
        assert!(!toml.contains("sk-live"));
    }
}
