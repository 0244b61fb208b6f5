//! # 客户端模块
//!
//! 凭据存储、访问码校验客户端、导航抽象与授权状态机。

pub mod auth_check;
pub mod navigator;
pub mod store;
pub mod verifier;

pub use auth_check::{AuthCheck, AuthState, CheckOutcome, Trigger};
pub use navigator::{AUTH_ROUTE, HistoryNavigator, Navigator, route_from_hash};
pub use store::{ClientCredentialState, CredentialStore, ProviderCredential, ValidityFlags};
pub use verifier::{ConfigVerifier, HttpConfigVerifier, VerifyReply, sync_danger_config};
