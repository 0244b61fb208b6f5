use std::sync::{Mutex, PoisonError};

/// 授权页路由
pub const AUTH_ROUTE: &str = "/auth";

/// 界面导航的抽象，授权状态机只通过它读取当前路由与跳转
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;

    fn navigate(&self, route: &str);
}

/// 将 `#/chat` 形式的 hash 转为路由
#[must_use]
pub fn route_from_hash(hash: &str) -> String {
    let route = hash.strip_prefix('#').unwrap_or(hash);
    if route.is_empty() {
        "/".to_string()
    } else {
        route.to_string()
    }
}

/// 进程内导航器，记录跳转历史
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial.into()]),
        }
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn current_route(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn navigate(&self, route: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

impl<T: Navigator + ?Sized> Navigator for std::sync::Arc<T> {
    fn current_route(&self) -> String {
        (**self).current_route()
    }

    fn navigate(&self, route: &str) {
        (**self).navigate(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_routes() {
        assert_eq!(route_from_hash("#/auth"), "/auth");
        assert_eq!(route_from_hash("#"), "/");
        assert_eq!(route_from_hash("/chat"), "/chat");
    }

    #[test]
    fn history_tracks_current_route() {
        let nav = HistoryNavigator::new("/chat");
        nav.navigate(AUTH_ROUTE);
        assert_eq!(nav.current_route(), AUTH_ROUTE);
        assert_eq!(nav.history(), vec!["/chat", "/auth"]);
    }
}
