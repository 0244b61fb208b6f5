//! # 校验端点服务器

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::response::handle_panic;
use crate::access::{AccessCodeTable, DangerConfig};
use crate::config::{AppConfig, ServerConfig};
use crate::error::{GateError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 启动时构建、此后只读的访问控制上下文
#[derive(Debug)]
pub struct AccessContext {
    pub table: AccessCodeTable,
    pub danger: DangerConfig,
}

impl AccessContext {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let table = AccessCodeTable::from_config(&config.access)?;
        let danger = DangerConfig::from_config(&config.access, &table);
        Ok(Self { table, danger })
    }

    #[must_use]
    pub const fn need_code(&self) -> bool {
        self.danger.need_code
    }

    #[must_use]
    pub const fn hide_user_api_key(&self) -> bool {
        self.danger.hide_user_api_key
    }
}

/// 处理器共享状态
#[derive(Debug, Clone)]
pub struct AppState {
    context: Arc<AccessContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AccessContext>) -> Self {
        Self { context }
    }

    #[must_use]
    pub const fn context_arc(&self) -> &Arc<AccessContext> {
        &self.context
    }
}

impl Deref for AppState {
    type Target = AccessContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 校验端点服务器
#[derive(Debug)]
pub struct ConfigServer {
    config: ServerConfig,
    state: AppState,
    router: Router,
}

impl ConfigServer {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let context = AccessContext::from_config(config)?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "access_context_ready",
            format!(
                "need_code={} codes={} digest={}",
                context.need_code(),
                context.table.len(),
                context.table.algorithm().as_str()
            )
        );

        let state = AppState::new(Arc::new(context));
        let router = Self::create_router(state.clone(), &config.server);

        Ok(Self {
            config: config.server.clone(),
            state,
            router,
        })
    }

    fn create_router(state: AppState, config: &ServerConfig) -> Router {
        let api_routes = super::routes::create_routes(state);
        let prefix = config.normalized_prefix();

        // axum 不允许在根路径 nest
        let app = if prefix.is_empty() {
            Router::new().merge(api_routes)
        } else {
            Router::new().nest(prefix, api_routes)
        };

        with_middleware(app, config)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 绑定配置中的监听地址
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_address();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| GateError::config_with_source(format!("无法监听 {addr}"), e))
    }

    /// 绑定并运行，直到收到 Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// 在给定监听器上运行，`shutdown` 完成后优雅退出
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            format!(
                "config endpoint listening on http://{local}{}/config",
                self.config.normalized_prefix()
            )
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GateError::internal_with_source("服务器异常退出", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stop",
            "config endpoint stopped"
        );
        Ok(())
    }
}

/// 叠加 panic 捕获、请求追踪、CORS 与请求体上限
pub fn with_middleware(app: Router, config: &ServerConfig) -> Router {
    let mut app = app.layer(DefaultBodyLimit::max(config.max_request_size));

    let service_builder = ServiceBuilder::new()
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors_layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

        let cors_layer = if config.cors_origins.iter().any(|origin| origin == "*") {
            cors_layer.allow_origin(Any)
        } else {
            let origins = config
                .cors_origins
                .iter()
                .map(|origin| origin.parse::<HeaderValue>())
                .collect::<std::result::Result<Vec<_>, _>>();

            match origins {
                Ok(origins) => cors_layer.allow_origin(origins),
                Err(e) => {
                    lwarn!(
                        "system",
                        LogStage::Startup,
                        LogComponent::ServerSetup,
                        "cors_config_fail",
                        format!("Invalid CORS origin configuration: {e}, falling back to allow any")
                    );
                    cors_layer.allow_origin(Any)
                }
            }
        };

        app = app.layer(service_builder.layer(cors_layer));
    } else {
        app = app.layer(service_builder);
    }

    app
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_fail",
            format!("failed to listen for Ctrl-C: {e}")
        );
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::abcd_config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn empty_prefix_mounts_at_root() {
        let mut config = abcd_config();
        config.server.api_prefix = "/".to_string();
        let server = ConfigServer::new(&config).unwrap();

        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn context_reflects_table() {
        let server = ConfigServer::new(&abcd_config()).unwrap();
        assert!(server.state().need_code());
        assert_eq!(server.state().table.len(), 1);
        assert_eq!(server.config().normalized_prefix(), "/api");
    }

    #[tokio::test]
    async fn serve_with_shutdown_stops_cleanly() {
        let server = ConfigServer::new(&abcd_config()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        server
            .serve_with_shutdown(listener, async {})
            .await
            .unwrap();
    }
}
