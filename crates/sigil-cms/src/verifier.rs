//! 将原文与分离式信封重新配对并验证

use std::fmt;

use const_oid::db::rfc5911::ID_DATA;
use der::{asn1::OctetString, Encode};
use sigil_key::{verify_with_spki, DigestAlgorithm};
use tracing::trace;

use crate::{
    attributes,
    envelope::{decode_signed_data, find_signer_certificate, looks_like_pem, pem_contents},
    SignedEnvelope,
};

/// 一次验证的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Verified,
    Failed(FailureReason),
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationResult::Verified)
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            VerificationResult::Verified => None,
            VerificationResult::Failed(reason) => Some(reason),
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Verified => f.write_str("verified"),
            VerificationResult::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// 不是可用的分离式 CMS 签名
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// 原文与签名时的内容不一致
    #[error("content does not match the signed digest")]
    ContentMismatch,

    /// 签名无法通过签名者证书验证
    #[error("signature invalid: {0}")]
    SignatureInvalid(String),
}

/// 无状态验证器，可在线程间共享
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier;

impl Verifier {
    pub fn new() -> Self {
        Self
    }

    /// 验证 `envelope` 是否为 `content` 的分离式签名
    ///
    /// 信封可以是 DER、BER 或 PEM。任意输入都不会 panic，
    /// 所有问题都以 [`FailureReason`] 返回。
    pub fn verify(&self, content: &[u8], envelope: &[u8]) -> VerificationResult {
        match check(content, envelope) {
            Ok(()) => {
                trace!(content_len = content.len(), "signature verified");
                VerificationResult::Verified
            }
            Err(reason) => {
                trace!(%reason, "verification failed");
                VerificationResult::Failed(reason)
            }
        }
    }

    pub fn verify_envelope(&self, content: &[u8], envelope: &SignedEnvelope) -> VerificationResult {
        self.verify(content, envelope.as_der())
    }
}

fn malformed(message: impl fmt::Display) -> FailureReason {
    FailureReason::MalformedEnvelope(message.to_string())
}

fn check(content: &[u8], envelope: &[u8]) -> Result<(), FailureReason> {
    let signed_data = if looks_like_pem(envelope) {
        let der = pem_contents(envelope).map_err(malformed)?;
        decode_signed_data(&der)
    } else {
        decode_signed_data(envelope)
    }
    .map_err(malformed)?;
    trace!("decoded SignedData");

    let signer_info = match signed_data.signer_infos.0.len() {
        1 => signed_data
            .signer_infos
            .0
            .get(0)
            .ok_or_else(|| malformed("missing signer info"))?,
        n => return Err(malformed(format!("expected exactly one signer, found {n}"))),
    };

    let encap = &signed_data.encap_content_info;
    if encap.econtent_type != ID_DATA {
        return Err(malformed(format!(
            "encapsulated content type {} is not id-data",
            encap.econtent_type
        )));
    }
    // 含原文的信封只有在原文完全一致时才接受
    if let Some(embedded) = &encap.econtent {
        let embedded = embedded
            .decode_as::<OctetString>()
            .map_err(|e| malformed(format!("embedded content: {e}")))?;
        if embedded.as_bytes() != content {
            return Err(FailureReason::ContentMismatch);
        }
    }

    let digest = DigestAlgorithm::from_oid(&signer_info.digest_alg.oid).ok_or_else(|| {
        malformed(format!(
            "unsupported digest algorithm {}",
            signer_info.digest_alg.oid
        ))
    })?;

    if !signed_data
        .digest_algorithms
        .iter()
        .any(|alg| alg.oid == signer_info.digest_alg.oid)
    {
        return Err(malformed(format!(
            "signer digest algorithm {} is not listed in digestAlgorithms",
            signer_info.digest_alg.oid
        )));
    }

    let certificate = find_signer_certificate(&signed_data, &signer_info.sid).ok_or_else(|| {
        FailureReason::SignatureInvalid("no embedded certificate matches the signer".to_string())
    })?;
    trace!(subject = %certificate.tbs_certificate.subject, "located signer certificate");

    let computed = digest.hash(content);
    let signed_bytes = match &signer_info.signed_attrs {
        Some(attrs) => {
            let message_digest = attributes::message_digest(attrs)
                .map_err(malformed)?
                .ok_or_else(|| malformed("messageDigest attribute missing"))?;
            if message_digest != computed {
                return Err(FailureReason::ContentMismatch);
            }

            let content_type = attributes::content_type(attrs)
                .map_err(malformed)?
                .ok_or_else(|| malformed("contentType attribute missing"))?;
            if content_type != encap.econtent_type {
                return Err(FailureReason::SignatureInvalid(format!(
                    "contentType attribute {content_type} does not match {}",
                    encap.econtent_type
                )));
            }

            // 签名覆盖 DER `SET OF` 编码，而不是 [0] IMPLICIT 编码
            attrs.to_der().map_err(malformed)?
        }
        None => content.to_vec(),
    };
    trace!(digest = %digest, "content digest matches");

    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(malformed)?;

    match verify_with_spki(
        &spki_der,
        &signer_info.signature_algorithm,
        digest,
        &signed_bytes,
        signer_info.signature.as_bytes(),
    ) {
        Ok(true) => Ok(()),
        Ok(false) => Err(FailureReason::SignatureInvalid(
            "signature does not match the signer certificate".to_string(),
        )),
        Err(e) => Err(FailureReason::SignatureInvalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_malformed() {
        let verifier = Verifier::new();
        let envelopes: [&[u8]; 4] = [b"", b"\x30", b"not der at all", b"-----BEGIN PKCS7-----\n"];
        for envelope in envelopes {
            assert!(matches!(
                verifier.verify(b"content", envelope),
                VerificationResult::Failed(FailureReason::MalformedEnvelope(_))
            ));
        }
    }

    #[test]
    fn test_result_display() {
        assert_eq!(VerificationResult::Verified.to_string(), "verified");
        let failed = VerificationResult::Failed(FailureReason::ContentMismatch);
        assert!(!failed.is_verified());
        assert_eq!(failed.failure(), Some(&FailureReason::ContentMismatch));
        assert_eq!(
            failed.to_string(),
            "failed: content does not match the signed digest"
        );
    }
}
