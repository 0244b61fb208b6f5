//! 访问码记录与只读访问码表

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::digest::{AccessCodeDigest, DigestAlgorithm};
use crate::config::AccessConfig;
use crate::error::{Context, GateError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 一个访问码授予的作用域配置
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCodeRecord {
    pub digest: AccessCodeDigest,
    pub api_key: String,
    pub base_url: String,
    pub custom_models: String,
    pub default_model: String,
}

impl AccessCodeRecord {
    /// 生成返回给客户端的作用域配置
    #[must_use]
    pub fn scoped_config(&self, hide_api_key: bool) -> ScopedConfig {
        ScopedConfig {
            api_key: Some(if hide_api_key {
                String::new()
            } else {
                self.api_key.clone()
            }),
            custom_models: Some(self.custom_models.clone()),
            default_model: Some(self.default_model.clone()),
            base_url: Some(self.base_url.clone()),
        }
    }
}

impl fmt::Debug for AccessCodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCodeRecord")
            .field("digest", &self.digest)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("custom_models", &self.custom_models)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// 校验成功时返回的作用域配置
///
/// 服务端总是填充全部四个字段；客户端合并时只处理出现的字段。
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub custom_models: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl fmt::Debug for ScopedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("custom_models", &self.custom_models)
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// 访问码表：启动时构建一次，此后只读
#[derive(Debug, Clone, Default)]
pub struct AccessCodeTable {
    algorithm: DigestAlgorithm,
    records: HashMap<AccessCodeDigest, AccessCodeRecord>,
}

impl AccessCodeTable {
    /// 从 `[access]` 配置构建
    pub fn from_config(access: &AccessConfig) -> Result<Self> {
        let algorithm = access.digest;
        let records = access
            .codes
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let digest = entry
                    .resolve_digest(algorithm)
                    .with_context(|| format!("access.codes[{index}]"))?;
                Ok(AccessCodeRecord {
                    digest,
                    api_key: entry.api_key.clone(),
                    base_url: entry.base_url.clone(),
                    custom_models: entry.custom_models.clone(),
                    default_model: entry.default_model.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let table = Self::from_records(algorithm, records)?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::AccessTable,
            "build_table",
            format!(
                "访问码表已构建: {} 条记录, 摘要算法 {}",
                table.len(),
                algorithm.as_str()
            )
        );
        Ok(table)
    }

    /// 由记录直接构建，重复摘要视为配置错误
    pub fn from_records(
        algorithm: DigestAlgorithm,
        records: impl IntoIterator<Item = AccessCodeRecord>,
    ) -> Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            let short = record.digest.short().to_string();
            if map.insert(record.digest.clone(), record).is_some() {
                return Err(GateError::config(format!("重复的访问码摘要: {short}…")));
            }
        }
        Ok(Self {
            algorithm,
            records: map,
        })
    }

    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// 计算明文访问码在本表算法下的摘要
    #[must_use]
    pub fn digest_of(&self, code: &str) -> AccessCodeDigest {
        self.algorithm.digest(code)
    }

    #[must_use]
    pub fn get(&self, digest: &AccessCodeDigest) -> Option<&AccessCodeRecord> {
        let found = self.records.get(digest);
        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::AccessTable,
            "lookup",
            format!("digest={} found={}", digest.short(), found.is_some())
        );
        found
    }

    /// 按明文访问码查找
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&AccessCodeRecord> {
        self.get(&self.digest_of(code))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
