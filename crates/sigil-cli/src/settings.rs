use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sigil_cms::SignerOptions;
use sigil_key::DigestAlgorithm;

use crate::error::{CliError, CliResult};

/// `sigil.toml` 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub identity: IdentitySettings,
    pub signing: SigningSettings,
    pub log: LogSettings,
}

/// 默认签名身份
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// 签名证书（PEM 或 DER）
    pub certificate: Option<PathBuf>,
    /// PKCS#8 私钥（PEM 或 DER）
    pub private_key: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningSettings {
    pub digest: DigestAlgorithm,
    /// 签名后立即自检
    pub self_check: bool,
    /// 输出 PEM（否则 DER）
    pub armor: bool,
    pub signing_time: bool,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            digest: DigestAlgorithm::Sha256,
            self_check: true,
            armor: true,
            signing_time: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// 读取配置文件，文件不存在时使用默认值
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    pub fn signer_options(&self) -> SignerOptions {
        SignerOptions {
            digest: self.signing.digest,
            self_check: self.signing.self_check,
            signing_time: self.signing.signing_time,
        }
    }
}
