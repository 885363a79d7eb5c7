//! 分离式签名信封：包裹 `SignedData` 的 DER `ContentInfo`

use std::{borrow::Cow, fmt, time::SystemTime};

use cms::{
    cert::CertificateChoices,
    content_info::ContentInfo,
    signed_data::{SignedData, SignerIdentifier},
};
use const_oid::db::{rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER, rfc5911::ID_SIGNED_DATA};
use der::{Decode, Encode};
use sigil_key::DigestAlgorithm;
use sigil_pki::{CertificateInfo, X509Certificate};
use x509_cert::{ext::pkix::SubjectKeyIdentifier, Certificate};

use crate::{attributes, ber, error::EnvelopeError};

/// [`SignedEnvelope::to_pem`] 使用的 PEM 标签
pub const PEM_LABEL: &str = "PKCS7";

/// 读取时同样接受的标签
pub const PEM_LABEL_CMS: &str = "CMS";

/// 编码后的分离式签名
///
/// 总是保存结构合法的 `ContentInfo { id-signedData }` DER，签名是否有效由验证器判断。
#[derive(Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    der: Vec<u8>,
}

impl SignedEnvelope {
    pub(crate) fn from_trusted_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    /// 包装 DER（或 BER）字节，检查能否解码为 CMS `SignedData`
    ///
    /// BER 输入会被转换为 DER 后保存。
    pub fn from_der(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let der = canonical_der(bytes)?.into_owned();
        decode_signed_data(&der)?;
        Ok(Self { der })
    }

    /// 解析标签为 `PKCS7` 或 `CMS` 的 PEM 信封
    pub fn from_pem(pem: &str) -> Result<Self, EnvelopeError> {
        Self::from_der(&pem_contents(pem.as_bytes())?)
    }

    /// 接受 PEM 或二进制编码
    pub fn parse(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if looks_like_pem(bytes) {
            Self::from_der(&pem_contents(bytes)?)
        } else {
            Self::from_der(bytes)
        }
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(PEM_LABEL, self.der.clone());
        pem::encode_config(
            &pem,
            pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        )
    }

    pub fn signed_data(&self) -> Result<SignedData, EnvelopeError> {
        decode_signed_data(&self.der)
    }

    /// 不含原文时为 `true`
    pub fn is_detached(&self) -> Result<bool, EnvelopeError> {
        Ok(self.signed_data()?.encap_content_info.econtent.is_none())
    }

    /// 信封携带的证书
    pub fn certificates(&self) -> Result<Vec<X509Certificate>, EnvelopeError> {
        let signed_data = self.signed_data()?;
        embedded_certificates(&signed_data)
            .map(|cert| -> Result<X509Certificate, EnvelopeError> {
                let der = cert.to_der()?;
                sigil_pki::import_certificate(&der)
                    .map_err(|e| EnvelopeError::Malformed(format!("embedded certificate: {e}")))
            })
            .collect()
    }

    /// 列出每个签名者的信息，用于展示
    pub fn signers(&self) -> Result<Vec<SignerSummary>, EnvelopeError> {
        let signed_data = self.signed_data()?;

        signed_data
            .signer_infos
            .0
            .iter()
            .map(|info| -> Result<SignerSummary, EnvelopeError> {
                let certificate = match find_signer_certificate(&signed_data, &info.sid) {
                    Some(cert) => {
                        let parsed = sigil_pki::parse_certificate(&cert.to_der()?).map_err(|e| {
                            EnvelopeError::Malformed(format!("signer certificate: {e}"))
                        })?;
                        Some(parsed)
                    }
                    None => None,
                };

                Ok(SignerSummary {
                    signer_id: describe_sid(&info.sid),
                    digest_algorithm: DigestAlgorithm::from_oid(&info.digest_alg.oid)
                        .map(|alg| alg.name().to_string())
                        .unwrap_or_else(|| info.digest_alg.oid.to_string()),
                    signature_algorithm: oid_name(&info.signature_algorithm.oid),
                    signing_time: info.signed_attrs.as_ref().and_then(attributes::signing_time),
                    certificate,
                })
            })
            .collect()
    }
}

impl fmt::Debug for SignedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedEnvelope")
            .field("len", &self.der.len())
            .finish()
    }
}

impl AsRef<[u8]> for SignedEnvelope {
    fn as_ref(&self) -> &[u8] {
        &self.der
    }
}

/// `inspect` 展示的单个签名者信息
#[derive(Debug, Clone)]
pub struct SignerSummary {
    pub signer_id: String,
    pub digest_algorithm: String,
    pub signature_algorithm: String,
    pub signing_time: Option<SystemTime>,
    /// 信封中携带的签名者证书
    pub certificate: Option<CertificateInfo>,
}

// ============================================================================
// 与验证器共用的解码函数
// ============================================================================

pub(crate) fn looks_like_pem(bytes: &[u8]) -> bool {
    bytes.trim_ascii_start().starts_with(b"-----BEGIN")
}

pub(crate) fn pem_contents(bytes: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let pem = pem::parse(bytes)?;
    match pem.tag() {
        PEM_LABEL | PEM_LABEL_CMS => Ok(pem.into_contents()),
        other => Err(EnvelopeError::UnexpectedLabel(other.to_string())),
    }
}

/// DER 原样返回；否则按 BER 转换，转换失败时报告原始的 DER 错误
pub(crate) fn canonical_der(bytes: &[u8]) -> Result<Cow<'_, [u8]>, EnvelopeError> {
    match ContentInfo::from_der(bytes) {
        Ok(_) => Ok(Cow::Borrowed(bytes)),
        Err(err) => {
            let der = ber::to_der(bytes).map_err(|_| err)?;
            ContentInfo::from_der(&der)?;
            Ok(Cow::Owned(der))
        }
    }
}

pub(crate) fn decode_signed_data(bytes: &[u8]) -> Result<SignedData, EnvelopeError> {
    let der = canonical_der(bytes)?;
    let content_info = ContentInfo::from_der(&der)?;
    if content_info.content_type != ID_SIGNED_DATA {
        return Err(EnvelopeError::Malformed(format!(
            "content type {} is not signedData",
            content_info.content_type
        )));
    }
    Ok(SignedData::from_der(&content_info.content.to_der()?)?)
}

fn embedded_certificates(signed_data: &SignedData) -> impl Iterator<Item = &Certificate> {
    signed_data
        .certificates
        .iter()
        .flat_map(|set| set.0.iter())
        .filter_map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Some(cert),
            CertificateChoices::Other(_) => None,
        })
}

/// 在内嵌证书中查找 `sid` 指向的证书
pub(crate) fn find_signer_certificate<'a>(
    signed_data: &'a SignedData,
    sid: &SignerIdentifier,
) -> Option<&'a Certificate> {
    embedded_certificates(signed_data).find(|cert| match sid {
        SignerIdentifier::IssuerAndSerialNumber(isn) => {
            cert.tbs_certificate.issuer == isn.issuer
                && cert.tbs_certificate.serial_number == isn.serial_number
        }
        SignerIdentifier::SubjectKeyIdentifier(ski) => {
            subject_key_identifier(cert).is_some_and(|own| own == *ski)
        }
    })
}

fn subject_key_identifier(cert: &Certificate) -> Option<SubjectKeyIdentifier> {
    cert.tbs_certificate
        .extensions
        .as_ref()?
        .iter()
        .find(|ext| ext.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER)
        .and_then(|ext| SubjectKeyIdentifier::from_der(ext.extn_value.as_bytes()).ok())
}

fn describe_sid(sid: &SignerIdentifier) -> String {
    match sid {
        SignerIdentifier::IssuerAndSerialNumber(isn) => format!(
            "issuer \"{}\", serial {}",
            isn.issuer,
            hex::encode(isn.serial_number.as_bytes())
        ),
        SignerIdentifier::SubjectKeyIdentifier(ski) => {
            format!("subject key id {}", hex::encode(ski.0.as_bytes()))
        }
    }
}

pub(crate) fn oid_name(oid: &const_oid::ObjectIdentifier) -> String {
    const_oid::db::DB
        .by_oid(oid)
        .map(str::to_string)
        .unwrap_or_else(|| oid.to_string())
}
