//! # 测试 Mock 对象
//!
//! 提供导航器与校验端点的替身，用于状态机单元测试

use async_trait::async_trait;
use mockall::mock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

use crate::access::{DangerConfig, ScopedConfig};
use crate::client::{ConfigVerifier, Navigator, VerifyReply};
use crate::error::{GateError, Result};

mock! {
    pub Navigator {}

    impl Navigator for Navigator {
        fn current_route(&self) -> String;
        fn navigate(&self, route: &str);
    }
}

/// 预先编排的校验结果
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Granted(ScopedConfig),
    Rejected(u16),
    TransportFailure,
}

impl ScriptedReply {
    fn into_result(self) -> Result<VerifyReply> {
        match self {
            Self::Granted(config) => Ok(VerifyReply::Granted(config)),
            Self::Rejected(status) => Ok(VerifyReply::Rejected(status)),
            Self::TransportFailure => Err(GateError::transport("connection refused")),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: AtomicUsize,
    codes: Mutex<Vec<String>>,
    danger: Mutex<DangerConfig>,
}

/// 按顺序返回编排结果的校验端点；结果用尽后视为网络失败
#[derive(Debug, Clone, Default)]
pub struct ScriptedVerifier {
    script: Arc<Script>,
}

impl ScriptedVerifier {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let script = Script {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Script::default()
        };
        Self {
            script: Arc::new(script),
        }
    }

    #[must_use]
    pub fn with_danger_config(self, config: DangerConfig) -> Self {
        *self
            .script
            .danger
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = config;
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// 按调用顺序记录的访问码
    #[must_use]
    pub fn received_codes(&self) -> Vec<String> {
        self.script
            .codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self, access_code: &str) -> Result<VerifyReply> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(access_code.to_string());
        self.script
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(ScriptedReply::TransportFailure)
            .into_result()
    }
}

#[async_trait]
impl ConfigVerifier for ScriptedVerifier {
    async fn verify(&self, access_code: &str) -> Result<VerifyReply> {
        self.next_reply(access_code)
    }

    async fn fetch_danger_config(&self) -> Result<DangerConfig> {
        Ok(self
            .script
            .danger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// 收到请求后挂起，直到测试调用 [`GatedVerifier::release`]
#[derive(Debug, Clone)]
pub struct GatedVerifier {
    inner: ScriptedVerifier,
    started: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedVerifier {
    #[must_use]
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            inner: ScriptedVerifier::new([reply]),
            started: Arc::new(Notify::new()),
            gate: Arc::new(Notify::new()),
        }
    }

    pub async fn wait_until_called(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl ConfigVerifier for GatedVerifier {
    async fn verify(&self, access_code: &str) -> Result<VerifyReply> {
        self.started.notify_one();
        self.gate.notified().await;
        self.inner.verify(access_code).await
    }

    async fn fetch_danger_config(&self) -> Result<DangerConfig> {
        self.inner.fetch_danger_config().await
    }
}
