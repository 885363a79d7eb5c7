use std::{fs, path::Path};

use const_oid::db::{rfc4519, rfc5280};
use der::{Decode, Encode};
use rand::RngCore;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use sha2::{Digest, Sha256};
use sigil_key::{Algorithm, SigningKey};
use time::{Duration, OffsetDateTime};
use x509_cert::{ext::pkix::BasicConstraints, name::Name, Certificate};

use super::types::{CertificateInfo, CertificateSubject, X509Certificate};
use crate::error::{PkiError, Result};

const PEM_LABEL: &str = "CERTIFICATE";

/// 创建自签名证书
///
/// # Arguments
/// * `key` - 签名私钥（RSA、P-256 或 Ed25519）
/// * `subject` - 证书主体信息
/// * `validity_days` - 有效期（天数）
///
/// # Returns
/// * `Result<X509Certificate>` - 成功返回X509证书
pub fn create_self_signed_certificate<K: SigningKey + ?Sized>(
    key: &K,
    subject: &CertificateSubject,
    validity_days: u32,
) -> Result<X509Certificate> {
    if subject.common_name.is_empty() {
        return Err(PkiError::GenerationError(
            "Common name must not be empty".to_string(),
        ));
    }

    let mut params = CertificateParams::default();

    // 设置证书主体信息
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, &subject.common_name);
    if let Some(country) = &subject.country {
        dn.push(DnType::CountryName, country);
    }
    if let Some(state) = &subject.state {
        dn.push(DnType::StateOrProvinceName, state);
    }
    if let Some(locality) = &subject.locality {
        dn.push(DnType::LocalityName, locality);
    }
    if let Some(org) = &subject.organization {
        dn.push(DnType::OrganizationName, org);
    }
    if let Some(ou) = &subject.organizational_unit {
        dn.push(DnType::OrganizationalUnitName, ou);
    }
    params.distinguished_name = dn;

    // 生效时间提前一小时以容忍时钟偏差，过期时间为当前时间加有效天数
    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::hours(1);
    params.not_after = now + Duration::days(i64::from(validity_days));

    // 随机正整数序列号
    let mut serial_number = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut serial_number);
    serial_number[0] &= 0x7f;
    params.serial_number = Some(serial_number.to_vec().into());

    params.is_ca = rcgen::IsCa::NoCa;
    params.key_usages = vec![
        rcgen::KeyUsagePurpose::DigitalSignature,
        rcgen::KeyUsagePurpose::ContentCommitment,
    ];

    // 使用私钥 PKCS8 PEM 格式创建 KeyPair
    let sign_algo = match key.algorithm() {
        Algorithm::Rsa => &rcgen::PKCS_RSA_SHA256,
        Algorithm::P256 => &rcgen::PKCS_ECDSA_P256_SHA256,
        Algorithm::Ed25519 => &rcgen::PKCS_ED25519,
    };
    let private_key_pem = key.to_pkcs8_pem()?;
    let key_pair = KeyPair::from_pkcs8_pem_and_sign_algo(&private_key_pem, sign_algo)
        .map_err(|e| PkiError::GenerationError(format!("Failed to create key pair: {e}")))?;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| PkiError::GenerationError(format!("Failed to create certificate: {e}")))?;

    import_certificate(cert.der())
}

/// 解析证书内容
///
/// # Arguments
/// * `cert_data` - 证书数据（DER或PEM格式）
///
/// # Returns
/// * `Result<CertificateInfo>` - 成功返回证书信息
pub fn parse_certificate(cert_data: &[u8]) -> Result<CertificateInfo> {
    let der_data = certificate_der(cert_data)?;
    let cert = Certificate::from_der(&der_data)
        .map_err(|e| PkiError::ParseError(format!("Failed to parse DER: {e}")))?;
    certificate_info(&cert)
}

/// 导出证书
///
/// # Arguments
/// * `cert` - 证书
/// * `format` - 导出格式（"PEM" 或 "DER"）
pub fn export_certificate(cert: &X509Certificate, format: &str) -> Result<Vec<u8>> {
    match format.to_uppercase().as_str() {
        "DER" => Ok(cert.der_data.clone()),
        "PEM" => {
            let pem = pem::Pem::new(PEM_LABEL, cert.der_data.clone());
            Ok(pem::encode(&pem).into_bytes())
        }
        _ => Err(PkiError::ExportError(format!(
            "Unsupported format: {format}"
        ))),
    }
}

/// 导入证书
///
/// # Arguments
/// * `cert_data` - 证书数据（PEM或DER格式）
pub fn import_certificate(cert_data: &[u8]) -> Result<X509Certificate> {
    let der_data = certificate_der(cert_data)?;
    let inner = Certificate::from_der(&der_data)
        .map_err(|e| PkiError::ImportError(format!("Failed to parse DER: {e}")))?;
    let info = certificate_info(&inner)?;

    Ok(X509Certificate {
        der_data,
        info,
        inner,
    })
}

/// 从文件导入证书
pub fn load_certificate_file<P: AsRef<Path>>(path: P) -> Result<X509Certificate> {
    let data = fs::read(path)?;
    import_certificate(&data)
}

// 辅助函数：PEM 转 DER，DER 原样返回
fn certificate_der(cert_data: &[u8]) -> Result<Vec<u8>> {
    if !cert_data.trim_ascii_start().starts_with(b"-----BEGIN") {
        return Ok(cert_data.to_vec());
    }

    let pem = pem::parse(cert_data)
        .map_err(|e| PkiError::ParseError(format!("Failed to parse PEM: {e}")))?;
    if pem.tag() != PEM_LABEL {
        return Err(PkiError::ParseError(format!(
            "Unexpected PEM label: {}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

fn certificate_info(cert: &Certificate) -> Result<CertificateInfo> {
    let tbs = &cert.tbs_certificate;

    let public_key = tbs.subject_public_key_info.to_der()?;
    let spki_fingerprint = hex::encode(Sha256::digest(&public_key));

    let mut is_ca = false;
    let mut path_len_constraint = None;
    if let Some(extensions) = &tbs.extensions {
        for ext in extensions
            .iter()
            .filter(|ext| ext.extn_id == rfc5280::ID_CE_BASIC_CONSTRAINTS)
        {
            let constraints = BasicConstraints::from_der(ext.extn_value.as_bytes())
                .map_err(|e| PkiError::ParseError(format!("Bad basicConstraints: {e}")))?;
            is_ca = constraints.ca;
            path_len_constraint = constraints.path_len_constraint;
        }
    }

    let signature_algorithm = const_oid::db::DB
        .by_oid(&cert.signature_algorithm.oid)
        .map(str::to_string)
        .unwrap_or_else(|| cert.signature_algorithm.oid.to_string());

    Ok(CertificateInfo {
        serial_number: hex::encode(tbs.serial_number.as_bytes()),
        subject: parse_distinguished_name(&tbs.subject),
        issuer: parse_distinguished_name(&tbs.issuer),
        not_before: parse_time(&tbs.validity.not_before)?,
        not_after: parse_time(&tbs.validity.not_after)?,
        public_key,
        spki_fingerprint,
        signature_algorithm,
        is_ca,
        path_len_constraint,
    })
}

// 辅助函数：解析DN（Distinguished Name），只取常见属性
fn parse_distinguished_name(name: &Name) -> CertificateSubject {
    let mut subject = CertificateSubject::default();

    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            // DirectoryString 的各种字符串类型都按 UTF-8 读取
            let Ok(value) = std::str::from_utf8(atv.value.value()) else {
                continue;
            };
            let value = value.to_string();

            if atv.oid == rfc4519::CN {
                subject.common_name = value;
            } else if atv.oid == rfc4519::C {
                subject.country = Some(value);
            } else if atv.oid == rfc4519::ST {
                subject.state = Some(value);
            } else if atv.oid == rfc4519::L {
                subject.locality = Some(value);
            } else if atv.oid == rfc4519::O {
                subject.organization = Some(value);
            } else if atv.oid == rfc4519::OU {
                subject.organizational_unit = Some(value);
            }
        }
    }

    subject
}

// 辅助函数：解析时间
fn parse_time(time: &x509_cert::time::Time) -> Result<OffsetDateTime> {
    let secs = time.to_unix_duration().as_secs();
    let secs = i64::try_from(secs)
        .map_err(|e| PkiError::ParseError(format!("Time out of range: {e}")))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| PkiError::ParseError(format!("Invalid time: {e}")))
}
