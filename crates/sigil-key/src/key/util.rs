use std::{convert::TryFrom, fs, path::Path};

use const_oid::ObjectIdentifier;
use pkcs8::{der::pem::PemLabel, spki::der::asn1::AnyRef, PrivateKeyInfo, SecretDocument};

use super::{ed25519::Ed25519Key, p256::P256Key, rsa::RsaKey, Algorithm, SigningKey};
use crate::error::{Error, Result};

/// 根据 PKCS#8 PEM 内容加载具备签名能力的密钥。
///
/// 会自动识别常见算法（Ed25519、P-256、RSA），并返回实现 `SigningKey` 的 trait object。
pub fn load_signing_key_from_pkcs8_pem(pem: &str) -> Result<Box<dyn SigningKey>> {
    let algorithm = detect_signing_algorithm_from_pem(pem)?;

    match algorithm {
        Algorithm::Ed25519 => Ok(Box::new(Ed25519Key::from_pkcs8_pem(pem)?)),
        Algorithm::P256 => Ok(Box::new(P256Key::from_pkcs8_pem(pem)?)),
        Algorithm::Rsa => Ok(Box::new(RsaKey::from_pkcs8_pem(pem)?)),
    }
}

/// 根据 PKCS#8 DER 数据加载具备签名能力的密钥。
pub fn load_signing_key_from_pkcs8_der(der: &[u8]) -> Result<Box<dyn SigningKey>> {
    let algorithm = detect_signing_algorithm_from_der(der)?;

    match algorithm {
        Algorithm::Ed25519 => Ok(Box::new(Ed25519Key::from_pkcs8_der(der)?)),
        Algorithm::P256 => Ok(Box::new(P256Key::from_pkcs8_der(der)?)),
        Algorithm::Rsa => Ok(Box::new(RsaKey::from_pkcs8_der(der)?)),
    }
}

/// 从文件加载私钥，PEM 与 DER 均可。
pub fn load_signing_key_from_file<P: AsRef<Path>>(path: P) -> Result<Box<dyn SigningKey>> {
    let bytes = fs::read(path)?;
    if bytes.starts_with(b"-----BEGIN") {
        let pem = String::from_utf8(bytes)
            .map_err(|e| Error::ImportError(format!("PEM is not valid UTF-8: {e}")))?;
        load_signing_key_from_pkcs8_pem(&pem)
    } else {
        load_signing_key_from_pkcs8_der(&bytes)
    }
}

fn detect_signing_algorithm(info: &PrivateKeyInfo<'_>) -> Result<Algorithm> {
    let oid = info.algorithm.oid;

    if oid == const_oid::db::rfc8410::ID_ED_25519 {
        return Ok(Algorithm::Ed25519);
    }

    if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
        return Ok(Algorithm::Rsa);
    }

    if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
        let Some(params) = info.algorithm.parameters else {
            return Err(Error::ImportError(
                "EC key is missing curve parameters".to_string(),
            ));
        };
        let curve_oid = parse_curve_oid(params)?;
        if curve_oid == const_oid::db::rfc5912::SECP_256_R_1 {
            return Ok(Algorithm::P256);
        }
        return Err(Error::UnsupportedAlgorithm(format!(
            "EC curve OID: {curve_oid}"
        )));
    }

    Err(Error::UnsupportedAlgorithm(format!(
        "signing algorithm OID: {oid}"
    )))
}

fn parse_curve_oid(any: AnyRef<'_>) -> Result<ObjectIdentifier> {
    ObjectIdentifier::try_from(any)
        .map_err(|e| Error::ImportError(format!("Failed to parse curve OID: {e}")))
}

fn detect_signing_algorithm_from_pem(pem: &str) -> Result<Algorithm> {
    let (label, doc) = SecretDocument::from_pem(pem)
        .map_err(|e| Error::ImportError(format!("Failed to decode PEM: {e}")))?;

    if label != PrivateKeyInfo::PEM_LABEL {
        return Err(Error::ImportError(format!("Invalid PKCS#8 label: {label}")));
    }

    let info = PrivateKeyInfo::try_from(doc.as_bytes())
        .map_err(|e| Error::ImportError(format!("Failed to parse PKCS#8: {e}")))?;

    detect_signing_algorithm(&info)
}

fn detect_signing_algorithm_from_der(der: &[u8]) -> Result<Algorithm> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| Error::ImportError(format!("Failed to parse PKCS#8: {e}")))?;

    detect_signing_algorithm(&info)
}
