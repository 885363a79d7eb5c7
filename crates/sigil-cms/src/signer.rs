//! 分离式 CMS 签名的生成

use std::time::SystemTime;

use cms::{
    cert::{CertificateChoices, IssuerAndSerialNumber},
    content_info::{CmsVersion, ContentInfo},
    signed_data::{
        CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo,
        SignerInfos,
    },
};
use const_oid::db::rfc5911::{ID_DATA, ID_SIGNED_DATA};
use der::{
    asn1::{OctetString, SetOfVec},
    Any, Encode,
};
use serde::{Deserialize, Serialize};
use sigil_key::DigestAlgorithm;
use spki::AlgorithmIdentifierOwned;
use tracing::{debug, warn};

use crate::{
    attributes,
    error::{Result, SignError},
    identity::SignerIdentity,
    verifier::{VerificationResult, Verifier},
    SignedEnvelope,
};

/// [`Signer`] 的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerOptions {
    /// 内容摘要算法，Ed25519 密钥固定使用 SHA-512
    pub digest: DigestAlgorithm,
    /// 签名后立即用验证器自检
    pub self_check: bool,
    /// 添加 `signingTime` 签名属性
    pub signing_time: bool,
}

impl Default for SignerOptions {
    fn default() -> Self {
        Self {
            digest: DigestAlgorithm::Sha256,
            self_check: true,
            signing_time: true,
        }
    }
}

/// 生成分离式 `SignedData` 信封
///
/// # Example
///
/// ```no_run
/// use sigil_cms::{Signer, SignerIdentity, Verifier};
///
/// let identity = SignerIdentity::from_files("signer_cert.pem", "signer_private.pem").unwrap();
/// let envelope = Signer::new().sign(b"payload", &identity).unwrap();
/// assert!(Verifier::new().verify(b"payload", envelope.as_der()).is_verified());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signer {
    options: SignerOptions,
}

impl Signer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SignerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SignerOptions {
        &self.options
    }

    /// 以 `identity` 对 `content` 签名，信封中不包含原文
    pub fn sign(&self, content: &[u8], identity: &SignerIdentity) -> Result<SignedEnvelope> {
        identity.ensure_consistent()?;

        let key = identity.key();
        let certificate = identity.certificate().certificate();
        let digest = key.digest_for(self.options.digest);

        // 1. 基于内容摘要构建签名属性
        let signing_time = self.options.signing_time.then(SystemTime::now);
        let signed_attrs =
            attributes::build_signed_attributes(ID_DATA, &digest.hash(content), signing_time)?;

        // 2. 对签名属性的 DER SET OF 签名
        let signature = key
            .sign(&signed_attrs.to_der()?, digest)
            .map_err(|e| SignError::InvalidIdentity(format!("key cannot sign: {e}")))?;

        // 3. 组装 SignerInfo 与 SignedData
        let digest_algorithm = AlgorithmIdentifierOwned {
            oid: digest.oid(),
            parameters: None,
        };
        let signer_info = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: certificate.tbs_certificate.issuer.clone(),
                serial_number: certificate.tbs_certificate.serial_number.clone(),
            }),
            digest_alg: digest_algorithm.clone(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: key.signature_algorithm_id(digest),
            signature: OctetString::new(signature)?,
            unsigned_attrs: None,
        };

        let mut digest_algorithms = SetOfVec::new();
        digest_algorithms.insert(digest_algorithm)?;

        let signed_data = SignedData {
            version: CmsVersion::V1,
            digest_algorithms,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: ID_DATA,
                econtent: None,
            },
            certificates: Some(CertificateSet::try_from(vec![
                CertificateChoices::Certificate(certificate.clone()),
            ])?),
            crls: None,
            signer_infos: SignerInfos::try_from(vec![signer_info])?,
        };

        let content_info = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data)?,
        };
        let envelope = SignedEnvelope::from_trusted_der(content_info.to_der()?);

        debug!(
            algorithm = %key.algorithm(),
            digest = %digest,
            content_len = content.len(),
            envelope = %envelope.to_pem(),
            "produced detached signature"
        );

        // 4. 自检
        if self.options.self_check {
            if let VerificationResult::Failed(reason) =
                Verifier::new().verify_envelope(content, &envelope)
            {
                warn!(%reason, "freshly produced envelope does not verify");
                return Err(SignError::SigningIntegrityError(reason.to_string()));
            }
        }

        Ok(envelope)
    }
}
