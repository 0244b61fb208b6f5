//! # 客户端凭据存储
//!
//! 进程内唯一的凭据状态，以 JSON 持久化。修改都在短暂的写锁内完成，
//! 落盘通过同目录临时文件再原子替换。

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::access::{DangerConfig, ScopedConfig};
use crate::error::{GateError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::provider::descriptor::{CredentialField, descriptor, descriptors};
use crate::provider::types::ServiceProvider;
use crate::{ldebug, lwarn};

/// 单个服务商的凭据
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderCredential {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub api_version: String,
}

impl ProviderCredential {
    #[must_use]
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::ApiKey => &self.api_key,
            CredentialField::ApiSecret => &self.api_secret,
            CredentialField::BaseUrl => &self.base_url,
            CredentialField::ApiVersion => &self.api_version,
        }
    }

    fn field_mut(&mut self, field: CredentialField) -> &mut String {
        match field {
            CredentialField::ApiKey => &mut self.api_key,
            CredentialField::ApiSecret => &mut self.api_secret,
            CredentialField::BaseUrl => &mut self.base_url,
            CredentialField::ApiVersion => &mut self.api_version,
        }
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// 授权相关的标志位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidityFlags {
    pub need_code: bool,
    pub access_code_valid: bool,
    pub hide_user_api_key: bool,
    #[serde(rename = "disableGPT4")]
    pub disable_gpt4: bool,
    pub hide_balance_query: bool,
    pub disable_fast_link: bool,
}

impl Default for ValidityFlags {
    fn default() -> Self {
        Self {
            need_code: true,
            access_code_valid: false,
            hide_user_api_key: false,
            disable_gpt4: false,
            hide_balance_query: false,
            disable_fast_link: false,
        }
    }
}

/// 客户端凭据状态快照
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientCredentialState {
    pub access_code: String,
    pub providers: BTreeMap<ServiceProvider, ProviderCredential>,
    pub custom_models: String,
    pub default_model: String,
    pub active_provider: ServiceProvider,
    pub flags: ValidityFlags,
}

impl ClientCredentialState {
    #[must_use]
    pub fn credential(&self, provider: ServiceProvider) -> Option<&ProviderCredential> {
        self.providers.get(&provider)
    }

    pub fn credential_mut(&mut self, provider: ServiceProvider) -> &mut ProviderCredential {
        self.providers.entry(provider).or_default()
    }

    /// 某字段的当前值，未配置时为空串
    #[must_use]
    pub fn field(&self, provider: ServiceProvider, field: CredentialField) -> &str {
        self.credential(provider).map_or("", |c| c.field(field))
    }

    /// 构造认证头时使用的候选凭据；讯飞为 `key:secret`
    #[must_use]
    pub fn candidate_credential(&self, provider: ServiceProvider) -> String {
        let key = self.field(provider, CredentialField::ApiKey).trim();
        if provider == ServiceProvider::Iflytek {
            let secret = self.field(provider, CredentialField::ApiSecret).trim();
            if key.is_empty() || secret.is_empty() {
                return String::new();
            }
            return format!("{key}:{secret}");
        }
        key.to_string()
    }

    #[must_use]
    pub fn has_access_code(&self) -> bool {
        !self.access_code.trim().is_empty()
    }

    /// 该服务商的必需字段是否都已填写
    #[must_use]
    pub fn is_provider_valid(&self, provider: ServiceProvider) -> bool {
        descriptor(provider)
            .required_fields
            .iter()
            .all(|&field| !self.field(provider, field).trim().is_empty())
    }

    #[must_use]
    pub fn has_valid_provider(&self) -> bool {
        ServiceProvider::ALL.iter().any(|&p| self.is_provider_valid(p))
    }

    /// 本地授权判定（未缓存访问码时使用）
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.has_valid_provider() || !self.flags.need_code || self.flags.access_code_valid
    }

    /// 合并校验成功返回的作用域配置，返回状态是否发生变化
    ///
    /// 只处理出现的字段，`apiKey`/`baseUrl` 写入共享的 OpenAI 凭据，访问码不受影响。
    pub fn merge_scoped_config(&mut self, config: &ScopedConfig) -> bool {
        let before = self.clone();

        if let Some(api_key) = &config.api_key {
            self.credential_mut(ServiceProvider::OpenAI).api_key.clone_from(api_key);
        }
        if let Some(base_url) = &config.base_url {
            self.credential_mut(ServiceProvider::OpenAI).base_url.clone_from(base_url);
        }
        if let Some(models) = &config.custom_models {
            self.custom_models.clone_from(models);
        }
        if let Some(model) = &config.default_model {
            self.default_model.clone_from(model);
        }
        self.flags.access_code_valid = true;

        *self != before
    }

    /// 合并公开配置的功能开关，返回状态是否发生变化
    pub fn merge_danger_config(&mut self, config: &DangerConfig) -> bool {
        let before = self.flags.clone();
        self.flags.need_code = config.need_code;
        self.flags.hide_user_api_key = config.hide_user_api_key;
        self.flags.disable_gpt4 = config.disable_gpt4;
        self.flags.hide_balance_query = config.hide_balance_query;
        self.flags.disable_fast_link = config.disable_fast_link;
        self.flags != before
    }

    /// 校验失败后清除全部访问凭据
    pub fn reset_access_credentials(&mut self) {
        self.access_code.clear();
        for credential in self.providers.values_mut() {
            credential.api_key.clear();
            credential.api_secret.clear();
        }
        if let Some(pooled) = self.providers.get_mut(&ServiceProvider::OpenAI) {
            pooled.base_url.clear();
        }
        self.custom_models.clear();
        self.default_model.clear();
        self.flags.access_code_valid = false;
    }

    /// 按字段键写入用户编辑（`openaiApiKey`、`azureUrl`、`accessCode` 等）
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            "accessCode" => self.access_code = value.trim().to_string(),
            "customModels" => self.custom_models = value,
            "defaultModel" => self.default_model = value,
            "provider" | "activeProvider" => self.active_provider = value.parse()?,
            _ => {
                let (provider, field) = field_for_key(key)
                    .ok_or_else(|| GateError::validation(format!("unknown credential field: {key}")))?;
                *self.credential_mut(provider).field_mut(field) = value;
            }
        }
        Ok(())
    }
}

fn field_for_key(key: &str) -> Option<(ServiceProvider, CredentialField)> {
    descriptors().iter().find_map(|d| {
        let candidates = [
            (Some(d.credential_field_key), CredentialField::ApiKey),
            (d.secret_field_key, CredentialField::ApiSecret),
            (Some(d.base_url_field_key), CredentialField::BaseUrl),
            (d.version_field_key, CredentialField::ApiVersion),
        ];
        candidates
            .into_iter()
            .find(|(k, _)| *k == Some(key))
            .map(|(_, field)| (d.id, field))
    })
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "<redacted>" }
}

impl fmt::Debug for ClientCredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialState")
            .field("access_code", &redact(&self.access_code))
            .field("providers", &self.providers)
            .field("custom_models", &self.custom_models)
            .field("default_model", &self.default_model)
            .field("active_provider", &self.active_provider)
            .field("flags", &self.flags)
            .finish()
    }
}

/// 凭据存储
#[derive(Debug, Default)]
pub struct CredentialStore {
    state: RwLock<ClientCredentialState>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// 仅驻留内存的存储
    #[must_use]
    pub fn in_memory(state: ClientCredentialState) -> Self {
        Self {
            state: RwLock::new(state),
            path: None,
        }
    }

    /// 从 JSON 文件加载；文件不存在时从空状态开始
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                GateError::config_with_source(format!("读取凭据文件失败: {}", path.display()), e)
            })?;
            serde_json::from_str(&content)?
        } else {
            ldebug!(
                "system",
                LogStage::Persistence,
                LogComponent::CredentialStore,
                "load",
                format!("凭据文件不存在，使用空状态: {}", path.display())
            );
            ClientCredentialState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 当前状态的拷贝
    #[must_use]
    pub fn snapshot(&self) -> ClientCredentialState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 修改并持久化
    pub fn update<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ClientCredentialState) -> R,
    {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut guard);
        self.persist(&guard)?;
        Ok(result)
    }

    /// 修改，仅在闭包报告有变化时持久化
    pub fn update_if<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut ClientCredentialState) -> bool,
    {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let changed = f(&mut guard);
        if changed {
            self.persist(&guard)?;
        }
        Ok(changed)
    }

    /// 用户编辑单个字段
    pub fn set_field(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.update(|state| state.set_field(key, value))?
    }

    /// 显式落盘
    pub fn save(&self) -> Result<()> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        self.persist(&guard)
    }

    fn persist(&self, state: &ClientCredentialState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(state)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| {
            lwarn!(
                "system",
                LogStage::Persistence,
                LogComponent::CredentialStore,
                "persist",
                format!("凭据文件替换失败: {}", path.display())
            );
            GateError::from(e.error)
        })?;

        ldebug!(
            "system",
            LogStage::Persistence,
            LogComponent::CredentialStore,
            "persist",
            format!("凭据已保存: {}", path.display())
        );
        Ok(())
    }
}
