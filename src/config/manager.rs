//! # 配置管理器
//!
//! 加载 TOML 配置文件，应用环境变量覆盖（`GATE_` 前缀与传统部署变量），并做一次性校验。

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AccessCodeEntry, AppConfig};
use crate::error::{GateError, Result};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "ACCESS_GATE_CONFIG_PATH";

/// 结构化覆盖变量前缀
pub const ENV_PREFIX: &str = "GATE_";

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<AppConfig>,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按环境变量定位配置文件并加载
    ///
    /// 显式指定的路径不存在时报错；默认路径不存在时使用内置默认值。
    pub fn new() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config_file = PathBuf::from(format!("config/config.{env_name}.toml"));
        if config_file.exists() {
            Self::from_file(config_file)
        } else {
            warn!("配置文件不存在: {:?}, 使用默认配置", config_file);
            Self::build(AppConfig::default(), None, env::vars())
        }
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config = Self::load_config_file(config_path)?;
        Self::build(config, Some(config_path.to_path_buf()), env::vars())
    }

    /// 从内存中的配置创建（不读取环境变量）
    pub fn from_config(config: AppConfig) -> Result<Self> {
        Self::build(config, None, std::iter::empty())
    }

    /// 从内存中的配置与给定的环境变量集合创建
    pub fn from_config_with_env<I>(config: AppConfig, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::build(config, None, vars)
    }

    fn build<I>(mut config: AppConfig, source: Option<PathBuf>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let applied = Self::apply_env_overrides(&mut config, vars)?;
        super::validate_config(&config)?;

        info!("配置管理器初始化完成");
        info!(
            "- 配置来源: {}",
            source
                .as_ref()
                .map_or_else(|| "内置默认值".to_string(), |p| p.display().to_string())
        );
        info!("- 环境变量覆盖: {} 个", applied);
        info!("- 访问码条目: {} 个", config.access.codes.len());

        Ok(Self {
            config: Arc::new(config),
            source,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 配置文件路径（若来自文件）
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(GateError::config(format!("配置文件不存在: {}", path.display())));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            GateError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            GateError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {}", path.display(), e),
                e,
            )
        })
    }

    /// 应用环境变量覆盖，返回生效的变量个数
    ///
    /// `GATE_SERVER_PORT` 形式的变量映射到 `server.port`；传统部署变量
    /// （`CODE`、`OPENAI_API_KEY` 等）在其后应用。
    pub fn apply_env_overrides<I>(config: &mut AppConfig, vars: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let mut applied = 0;

        let mut structured: Vec<(String, &str)> = vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|rest| (rest.to_lowercase().replace('_', "."), value.as_str()))
            })
            .collect();
        structured.sort();

        for (path, value) in structured {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("key") || path.contains("code") {
                    "***"
                } else {
                    value
                }
            );
            if Self::apply_override_to_config(config, &path, value)? {
                applied += 1;
            }
        }

        applied += Self::apply_legacy_overrides(config, &vars);
        debug!("发现 {} 个环境变量覆盖", applied);
        Ok(applied)
    }

    /// 将单个覆盖应用到配置对象，未知路径返回 `false`
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<bool> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] | ["server", "bind", "address"] => {
                config.server.bind_address = value.to_string();
            }
            ["server", "port"] => {
                config.server.port = value.parse().map_err(|e| {
                    GateError::config_with_source(format!("无效的端口号: {value}"), e)
                })?;
            }
            ["server", "api", "prefix"] => config.server.api_prefix = value.to_string(),
            ["server", "enable", "cors"] => config.server.enable_cors = parse_bool(path, value)?,
            ["server", "cors", "origins"] => {
                config.server.cors_origins = split_list(value);
            }
            ["server", "max", "request", "size"] => {
                config.server.max_request_size = value.parse().map_err(|e| {
                    GateError::config_with_source(format!("无效的请求体上限: {value}"), e)
                })?;
            }
            ["access", "need", "code"] => config.access.need_code = Some(parse_bool(path, value)?),
            ["access", "hide", "user", "api", "key"] => {
                config.access.hide_user_api_key = parse_bool(path, value)?;
            }
            ["access", "disable", "gpt4"] => config.access.disable_gpt4 = parse_bool(path, value)?,
            ["access", "hide", "balance", "query"] => {
                config.access.hide_balance_query = parse_bool(path, value)?;
            }
            ["access", "disable", "fast", "link"] => {
                config.access.disable_fast_link = parse_bool(path, value)?;
            }
            ["access", "custom", "models"] => config.access.custom_models = value.to_string(),
            ["access", "default", "model"] => config.access.default_model = value.to_string(),
            ["access", "digest"] => config.access.digest = value.parse()?,
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// 传统部署变量：任何非空值即视为开启
    fn apply_legacy_overrides(config: &mut AppConfig, vars: &HashMap<String, String>) -> usize {
        let lookup = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());
        let mut applied = 0;

        let flags: [(&str, &mut bool); 4] = [
            ("HIDE_USER_API_KEY", &mut config.access.hide_user_api_key),
            ("DISABLE_GPT4", &mut config.access.disable_gpt4),
            ("HIDE_BALANCE_QUERY", &mut config.access.hide_balance_query),
            ("DISABLE_FAST_LINK", &mut config.access.disable_fast_link),
        ];
        for (key, slot) in flags {
            if let Some(value) = lookup(key) {
                *slot = legacy_flag(value);
                applied += 1;
            }
        }

        if let Some(models) = lookup("CUSTOM_MODELS") {
            config.access.custom_models = models.to_string();
            applied += 1;
        }
        if let Some(model) = lookup("DEFAULT_MODEL") {
            config.access.default_model = model.to_string();
            applied += 1;
        }

        if let Some(codes) = lookup("CODE") {
            let api_key = lookup("OPENAI_API_KEY").unwrap_or_default();
            let base_url = lookup("BASE_URL").unwrap_or_default();
            let before = config.access.codes.len();
            config.access.codes.extend(split_list(codes).into_iter().map(|code| AccessCodeEntry {
                code: Some(code),
                digest: None,
                api_key: api_key.to_string(),
                base_url: base_url.to_string(),
                custom_models: config.access.custom_models.clone(),
                default_model: config.access.default_model.clone(),
            }));
            debug!("从 CODE 变量加载 {} 个访问码", config.access.codes.len() - before);
            applied += 1;
        }

        applied
    }
}

fn parse_bool(path: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .map_err(|e| GateError::config_with_source(format!("无效的布尔值 {path}: {value}"), e))
}

fn legacy_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
