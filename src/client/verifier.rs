//! # 访问码校验客户端
//!
//! [`ConfigVerifier`] 抽象对校验端点的调用，[`HttpConfigVerifier`] 是基于 reqwest 的实现。

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use url::Url;

use super::store::CredentialStore;
use crate::access::{DangerConfig, ScopedConfig};
use crate::error::{GateError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 一次校验的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyReply {
    /// 200，携带作用域配置
    Granted(ScopedConfig),
    /// 其余任何状态码
    Rejected(u16),
}

#[async_trait]
pub trait ConfigVerifier: Send + Sync {
    /// 以访问码换取作用域配置；网络失败返回 `Err`
    async fn verify(&self, access_code: &str) -> Result<VerifyReply>;

    /// 读取公开配置；401 视为已启用访问控制
    async fn fetch_danger_config(&self) -> Result<DangerConfig>;
}

#[async_trait]
impl<T: ConfigVerifier + ?Sized> ConfigVerifier for std::sync::Arc<T> {
    async fn verify(&self, access_code: &str) -> Result<VerifyReply> {
        (**self).verify(access_code).await
    }

    async fn fetch_danger_config(&self) -> Result<DangerConfig> {
        (**self).fetch_danger_config().await
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfigVerifier {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpConfigVerifier {
    /// `endpoint` 为校验端点完整地址，例如 `http://127.0.0.1:3000/api/config`
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GateError::config_with_source(format!("无效的校验端点: {endpoint}"), e))?;
        Ok(Self { http, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConfigVerifier for HttpConfigVerifier {
    async fn verify(&self, access_code: &str) -> Result<VerifyReply> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "accessCode": access_code }))
            .send()
            .await
            .map_err(|e| GateError::transport_with_source("校验端点不可达", e))?;

        let status = response.status();
        ldebug!(
            "client",
            LogStage::Authentication,
            LogComponent::AuthCheck,
            "verify",
            format!("endpoint={} status={}", self.endpoint, status.as_u16())
        );

        if status != StatusCode::OK {
            return Ok(VerifyReply::Rejected(status.as_u16()));
        }

        let config = response
            .json::<ScopedConfig>()
            .await
            .map_err(|e| GateError::transport_with_source("校验响应格式无效", e))?;
        Ok(VerifyReply::Granted(config))
    }

    async fn fetch_danger_config(&self) -> Result<DangerConfig> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| GateError::transport_with_source("校验端点不可达", e))?;

        let status = response.status();
        // 启用访问控制时未携带访问码的读取返回 401
        if status == StatusCode::UNAUTHORIZED {
            ldebug!(
                "client",
                LogStage::Configuration,
                LogComponent::CredentialStore,
                "fetch_danger_config",
                "端点要求访问码"
            );
            return Ok(DangerConfig {
                need_code: true,
                ..DangerConfig::default()
            });
        }
        if status != StatusCode::OK {
            return Err(GateError::transport(format!(
                "读取公开配置失败: HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<DangerConfig>()
            .await
            .map_err(|e| GateError::transport_with_source("公开配置格式无效", e))
    }
}

/// 拉取公开配置并合并功能开关，返回是否有变化
pub async fn sync_danger_config<V>(store: &CredentialStore, verifier: &V) -> Result<bool>
where
    V: ConfigVerifier + ?Sized,
{
    let config = verifier.fetch_danger_config().await?;
    let changed = store.update_if(|state| state.merge_danger_config(&config))?;
    linfo!(
        "client",
        LogStage::Configuration,
        LogComponent::CredentialStore,
        "sync_danger_config",
        format!("need_code={} changed={}", config.need_code, changed)
    );
    Ok(changed)
}
