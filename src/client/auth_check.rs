//! # 授权状态机
//!
//! `Idle → Checking → {Authorized, Unauthorized} → Idle`。
//!
//! 每次触发（挂载或路由变化）：
//! 1. 缓存了访问码：调用校验端点。200 合并作用域配置；网络失败或任何其他状态码
//!    清除访问凭据并跳转授权页。
//! 2. 没有访问码：任一服务商凭据完整、未启用访问控制或访问码已校验通过即视为已授权；
//!    否则若当前不在授权页则跳转。
//!
//! 检查进行中到达的触发被直接丢弃，不排队；因此同一实例任何时刻至多一个校验请求在途。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use super::navigator::{AUTH_ROUTE, Navigator};
use super::store::{ClientCredentialState, CredentialStore};
use super::verifier::{ConfigVerifier, VerifyReply};
use crate::access::ScopedConfig;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 状态机当前所处阶段；检查结束后总是回到 `Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// 没有检查在进行
    Idle,
    /// 校验请求或本地判定进行中
    Checking,
    Authorized,
    Unauthorized,
}

/// 引发一次授权检查的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// 应用首次挂载
    Mount,
    /// 路由变化，携带新路由
    RouteChange(String),
}

/// 一次触发的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Authorized,
    /// `redirected` 表示是否已跳转到授权页
    Unauthorized { redirected: bool },
    /// 已有检查在进行，本次触发被丢弃
    Dropped,
}

/// 忙标志的 RAII 守卫；即使检查 future 被中途丢弃也会复位
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a Mutex<AuthState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a AtomicBool, state: &'a Mutex<AuthState>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { busy, state })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = AuthState::Idle;
        self.busy.store(false, Ordering::Release);
    }
}

/// 授权状态机：持有共享凭据存储、校验端点与导航器
pub struct AuthCheck<V, N> {
    store: Arc<CredentialStore>,
    verifier: V,
    navigator: N,
    busy: AtomicBool,
    state: Mutex<AuthState>,
}

impl<V, N> AuthCheck<V, N>
where
    V: ConfigVerifier,
    N: Navigator,
{
    /// 创建处于 `Idle` 的状态机
    pub fn new(store: Arc<CredentialStore>, verifier: V, navigator: N) -> Self {
        Self {
            store,
            verifier,
            navigator,
            busy: AtomicBool::new(false),
            state: Mutex::new(AuthState::Idle),
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 是否有检查正在进行
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    fn transition(&self, to: AuthState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        ldebug!(
            "client",
            LogStage::Authentication,
            LogComponent::AuthCheck,
            "transition",
            format!("{:?} -> {:?}", *state, to)
        );
        *state = to;
    }

    /// 处理一次触发
    pub async fn on_trigger(&self, trigger: Trigger) -> CheckOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy, &self.state) else {
            ldebug!(
                "client",
                LogStage::Authentication,
                LogComponent::AuthCheck,
                "trigger_dropped",
                format!("{trigger:?}")
            );
            return CheckOutcome::Dropped;
        };

        self.transition(AuthState::Checking);

        let outcome = self.check().await;
        match outcome {
            CheckOutcome::Authorized => self.transition(AuthState::Authorized),
            CheckOutcome::Unauthorized { .. } => self.transition(AuthState::Unauthorized),
            CheckOutcome::Dropped => {}
        }

        linfo!(
            "client",
            LogStage::Authentication,
            LogComponent::AuthCheck,
            "check_complete",
            format!("trigger={trigger:?} outcome={outcome:?}")
        );
        outcome
    }

    async fn check(&self) -> CheckOutcome {
        let snapshot = self.store.snapshot();
        if snapshot.has_access_code() {
            self.verify_access_code(snapshot.access_code.trim()).await
        } else {
            self.evaluate_local(&snapshot)
        }
    }

    async fn verify_access_code(&self, code: &str) -> CheckOutcome {
        match self.verifier.verify(code).await {
            Ok(VerifyReply::Granted(config)) => {
                self.merge(&config);
                CheckOutcome::Authorized
            }
            Ok(VerifyReply::Rejected(status)) => {
                lwarn!(
                    "client",
                    LogStage::Authentication,
                    LogComponent::AuthCheck,
                    "verify_rejected",
                    format!("校验端点拒绝访问码: HTTP {status}")
                );
                self.reset_and_redirect()
            }
            Err(err) => {
                lwarn!(
                    "client",
                    LogStage::Authentication,
                    LogComponent::AuthCheck,
                    "verify_failed",
                    format!("校验请求失败: {err}")
                );
                self.reset_and_redirect()
            }
        }
    }

    fn merge(&self, config: &ScopedConfig) {
        match self
            .store
            .update_if(|state| state.merge_scoped_config(config))
        {
            Ok(changed) => ldebug!(
                "client",
                LogStage::Persistence,
                LogComponent::AuthCheck,
                "merge_scoped_config",
                format!("changed={changed}")
            ),
            Err(err) => lwarn!(
                "client",
                LogStage::Persistence,
                LogComponent::AuthCheck,
                "merge_scoped_config",
                format!("保存凭据失败: {err}")
            ),
        }
    }

    fn reset_and_redirect(&self) -> CheckOutcome {
        if let Err(err) = self
            .store
            .update(ClientCredentialState::reset_access_credentials)
        {
            lwarn!(
                "client",
                LogStage::Persistence,
                LogComponent::AuthCheck,
                "reset",
                format!("保存凭据失败: {err}")
            );
        }
        self.navigator.navigate(AUTH_ROUTE);
        CheckOutcome::Unauthorized { redirected: true }
    }

    fn evaluate_local(&self, snapshot: &ClientCredentialState) -> CheckOutcome {
        if snapshot.is_authorized() {
            return CheckOutcome::Authorized;
        }
        if self.navigator.current_route() == AUTH_ROUTE {
            return CheckOutcome::Unauthorized { redirected: false };
        }
        self.navigator.navigate(AUTH_ROUTE);
        CheckOutcome::Unauthorized { redirected: true }
    }
}

impl<V, N> AuthCheck<V, N>
where
    V: ConfigVerifier + 'static,
    N: Navigator + 'static,
{
    /// 在后台任务中处理触发
    pub fn spawn_trigger(self: &Arc<Self>, trigger: Trigger) -> JoinHandle<CheckOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.on_trigger(trigger).await })
    }
}

impl<V, N> std::fmt::Debug for AuthCheck<V, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCheck")
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .field("state", &*self.state.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::navigator::HistoryNavigator;
    use crate::testing::fixtures::{scoped_abcd, state_with_code};
    use crate::testing::mocks::{GatedVerifier, MockNavigator, ScriptedReply, ScriptedVerifier};
    use crate::provider::ServiceProvider;
    use crate::provider::descriptor::CredentialField;
    use pretty_assertions::assert_eq;

    fn check_with<V: ConfigVerifier>(
        state: ClientCredentialState,
        verifier: V,
        route: &str,
    ) -> AuthCheck<V, Arc<HistoryNavigator>> {
        AuthCheck::new(
            Arc::new(CredentialStore::in_memory(state)),
            verifier,
            Arc::new(HistoryNavigator::new(route)),
        )
    }

    #[tokio::test]
    async fn granted_code_merges_and_authorizes() {
        let verifier = ScriptedVerifier::new([ScriptedReply::Granted(scoped_abcd())]);
        let check = check_with(state_with_code("ABCD"), verifier, "/chat");

        assert_eq!(check.on_trigger(Trigger::Mount).await, CheckOutcome::Authorized);

        let state = check.store().snapshot();
        assert_eq!(state.access_code, "ABCD");
        assert_eq!(state.field(ServiceProvider::OpenAI, CredentialField::ApiKey), "sk-xyz");
        assert_eq!(state.default_model, "gpt-4");
        assert!(state.flags.access_code_valid);
        assert_eq!(check.navigator().history(), vec!["/chat"]);
        assert_eq!(check.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn rejected_code_resets_and_redirects() {
        for reply in [
            ScriptedReply::Rejected(401),
            ScriptedReply::Rejected(403),
            ScriptedReply::Rejected(500),
            ScriptedReply::TransportFailure,
        ] {
            let mut state = state_with_code("ABCD");
            state.set_field("anthropicApiKey", "sk-ant").unwrap();
            state.flags.access_code_valid = true;
            let check = check_with(state, ScriptedVerifier::new([reply]), "/chat");

            assert_eq!(
                check.on_trigger(Trigger::Mount).await,
                CheckOutcome::Unauthorized { redirected: true }
            );
            let state = check.store().snapshot();
            assert_eq!(state.access_code, "");
            assert_eq!(state.field(ServiceProvider::Anthropic, CredentialField::ApiKey), "");
            assert!(!state.flags.access_code_valid);
            assert_eq!(check.navigator().current_route(), AUTH_ROUTE);
        }
    }

    #[tokio::test]
    async fn local_key_authorizes_without_network() {
        let mut state = ClientCredentialState::default();
        state.set_field("openaiApiKey", "sk-own").unwrap();
        let verifier = ScriptedVerifier::new([]);
        let check = check_with(state, verifier.clone(), "/chat");

        assert_eq!(check.on_trigger(Trigger::Mount).await, CheckOutcome::Authorized);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn access_control_disabled_authorizes() {
        let mut state = ClientCredentialState::default();
        state.flags.need_code = false;
        let check = check_with(state, ScriptedVerifier::new([]), "/chat");
        assert_eq!(check.on_trigger(Trigger::Mount).await, CheckOutcome::Authorized);
    }

    #[tokio::test]
    async fn auth_route_is_never_redirected_away_from() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_route()
            .return_const(AUTH_ROUTE.to_string());
        navigator.expect_navigate().never();

        let check = AuthCheck::new(
            Arc::new(CredentialStore::in_memory(ClientCredentialState::default())),
            ScriptedVerifier::new([]),
            navigator,
        );
        assert_eq!(
            check.on_trigger(Trigger::RouteChange(AUTH_ROUTE.into())).await,
            CheckOutcome::Unauthorized { redirected: false }
        );
    }

    #[tokio::test]
    async fn unauthorized_elsewhere_redirects_once() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_route()
            .return_const("/chat".to_string());
        navigator
            .expect_navigate()
            .withf(|route: &str| route == AUTH_ROUTE)
            .times(1)
            .return_const(());

        let check = AuthCheck::new(
            Arc::new(CredentialStore::in_memory(ClientCredentialState::default())),
            ScriptedVerifier::new([]),
            navigator,
        );
        assert_eq!(
            check.on_trigger(Trigger::Mount).await,
            CheckOutcome::Unauthorized { redirected: true }
        );
    }

    #[tokio::test]
    async fn triggers_during_a_check_are_dropped() {
        let verifier = GatedVerifier::new(ScriptedReply::Granted(scoped_abcd()));
        let check = Arc::new(check_with(state_with_code("ABCD"), verifier.clone(), "/chat"));

        let first = check.spawn_trigger(Trigger::Mount);
        verifier.wait_until_called().await;
        assert!(check.is_busy());
        assert_eq!(check.state(), AuthState::Checking);

        assert_eq!(
            check.on_trigger(Trigger::RouteChange("/settings".into())).await,
            CheckOutcome::Dropped
        );
        assert_eq!(
            check.on_trigger(Trigger::RouteChange("/chat".into())).await,
            CheckOutcome::Dropped
        );

        verifier.release();
        assert_eq!(first.await.unwrap(), CheckOutcome::Authorized);
        assert_eq!(verifier.calls(), 1);
        assert!(!check.is_busy());
    }

    #[tokio::test]
    async fn dropping_an_in_flight_check_releases_the_guard() {
        let verifier = GatedVerifier::new(ScriptedReply::Granted(scoped_abcd()));
        let check = Arc::new(check_with(state_with_code("ABCD"), verifier.clone(), "/chat"));

        let handle = check.spawn_trigger(Trigger::Mount);
        verifier.wait_until_called().await;
        handle.abort();
        let _ = handle.await;

        assert!(!check.is_busy());
        assert_eq!(check.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn cached_code_is_verified_without_surrounding_whitespace() {
        let verifier = ScriptedVerifier::new([ScriptedReply::Granted(scoped_abcd())]);
        let mut state = state_with_code("ABCD");
        state.access_code = " ABCD \n".into();
        let check = check_with(state, verifier.clone(), "/chat");

        assert_eq!(check.on_trigger(Trigger::Mount).await, CheckOutcome::Authorized);
        assert_eq!(verifier.received_codes(), vec!["ABCD".to_string()]);
    }

    #[tokio::test]
    async fn repeated_verification_is_idempotent() {
        let verifier = ScriptedVerifier::new([
            ScriptedReply::Granted(scoped_abcd()),
            ScriptedReply::Granted(scoped_abcd()),
        ]);
        let check = check_with(state_with_code("ABCD"), verifier, "/chat");

        check.on_trigger(Trigger::Mount).await;
        let first = check.store().snapshot();
        check.on_trigger(Trigger::RouteChange("/chat".into())).await;
        assert_eq!(check.store().snapshot(), first);
    }
}
