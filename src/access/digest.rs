//! 访问码摘要
//!
//! 访问码以明文提交，服务端只保存并比对其摘要。

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// 摘要算法，默认 MD5（与已部署的访问码表兼容）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    /// 十六进制摘要长度
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }

    /// 计算明文访问码的摘要
    #[must_use]
    pub fn digest(self, code: &str) -> AccessCodeDigest {
        let hex = match self {
            Self::Md5 => format!("{:x}", md5::compute(code.as_bytes())),
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(code.as_bytes());
                format!("{:x}", hasher.finalize())
            }
        };
        AccessCodeDigest(hex)
    }

    /// 解析配置中预先计算好的摘要
    pub fn parse_digest(self, hex: &str) -> Result<AccessCodeDigest> {
        let hex = hex.trim();
        if hex.len() != self.hex_len() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GateError::config(format!(
                "无效的{}摘要: 需要 {} 位十六进制字符",
                self.as_str(),
                self.hex_len()
            )));
        }
        Ok(AccessCodeDigest(hex.to_ascii_lowercase()))
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(GateError::config(format!("不支持的摘要算法: {other}"))),
        }
    }
}

/// 小写十六进制摘要
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessCodeDigest(String);

impl AccessCodeDigest {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 日志用的截断形式
    #[must_use]
    pub fn short(&self) -> &str {
        crate::logging::short_digest(&self.0)
    }
}

impl fmt::Debug for AccessCodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessCodeDigest({}…)", self.short())
    }
}

impl fmt::Display for AccessCodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
