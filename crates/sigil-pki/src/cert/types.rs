use der::Encode;
use serde::{Deserialize, Serialize};
use sigil_key::Key;
use time::OffsetDateTime;

use crate::error::Result;

/// 证书主体信息
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CertificateSubject {
    /// 国家 (C)
    pub country: Option<String>,
    /// 省/州 (ST)
    pub state: Option<String>,
    /// 城市 (L)
    pub locality: Option<String>,
    /// 组织 (O)
    pub organization: Option<String>,
    /// 组织单位 (OU)
    pub organizational_unit: Option<String>,
    /// 通用名称 (CN)
    pub common_name: String,
}

impl CertificateSubject {
    /// 创建一个新的证书主体
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Default::default()
        }
    }

    /// 带组织信息的签名者主体
    pub fn signer(
        common_name: impl Into<String>,
        organization: Option<String>,
        country: Option<String>,
    ) -> Self {
        Self {
            country,
            organization,
            common_name: common_name.into(),
            ..Default::default()
        }
    }
}

/// 证书信息结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// 序列号（十六进制）
    pub serial_number: String,
    /// 证书主体
    pub subject: CertificateSubject,
    /// 颁发者
    pub issuer: CertificateSubject,
    /// 生效时间
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    /// 过期时间
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    /// SubjectPublicKeyInfo DER
    pub public_key: Vec<u8>,
    /// SPKI 的 SHA-256 指纹（十六进制）
    pub spki_fingerprint: String,
    /// 证书签名算法 OID
    pub signature_algorithm: String,
    /// 是否为CA证书
    pub is_ca: bool,
    /// 证书链深度限制
    pub path_len_constraint: Option<u8>,
}

impl CertificateInfo {
    /// 检查证书是否在有效期内
    pub fn is_valid_at(&self, time: OffsetDateTime) -> bool {
        time >= self.not_before && time <= self.not_after
    }

    /// 检查证书当前是否有效
    pub fn is_currently_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    /// 获取证书剩余有效天数
    pub fn days_until_expiry(&self) -> i64 {
        let now = OffsetDateTime::now_utc();
        (self.not_after - now).whole_days()
    }
}

/// X.509 证书包装结构
#[derive(Debug, Clone)]
pub struct X509Certificate {
    /// 证书DER格式数据
    pub der_data: Vec<u8>,
    /// 证书信息
    pub info: CertificateInfo,
    /// 解析后的证书
    pub(crate) inner: x509_cert::Certificate,
}

impl X509Certificate {
    /// 底层 `x509_cert` 证书
    pub fn certificate(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// 主体 DN 的 RFC 4514 字符串
    pub fn subject_dn(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// 颁发者 DN 的 RFC 4514 字符串
    pub fn issuer_dn(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// 证书中的 SubjectPublicKeyInfo（DER）
    pub fn spki_der(&self) -> Result<Vec<u8>> {
        Ok(self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()?)
    }

    /// 证书公钥是否与给定私钥匹配
    pub fn matches_key<K: Key + ?Sized>(&self, key: &K) -> Result<bool> {
        Ok(self.spki_der()? == key.spki_der()?)
    }
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der_data == other.der_data
    }
}

impl Eq for X509Certificate {}
