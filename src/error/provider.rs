//! Errors raised by vendor platform collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider '{provider}' API error: {status} - {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from provider '{provider}': {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Unsupported feature '{feature}' for provider '{provider}'")]
    UnsupportedFeature { provider: String, feature: String },

    #[error("Provider '{provider}' stream error: {message}")]
    Stream { provider: String, message: String },
}

impl ProviderError {
    /// 出错的服务商标识
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::ApiError { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::UnsupportedFeature { provider, .. }
            | Self::Stream { provider, .. } => provider,
        }
    }

    pub fn unsupported(provider: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            provider: provider.into(),
            feature: feature.into(),
        }
    }
}
