//! Sigil PKI - X.509 证书处理
//!
//! 提供签名者证书的导入、导出、解析以及自签名证书生成

pub mod cert;
pub mod error;

pub use cert::{
    create_self_signed_certificate, export_certificate, import_certificate,
    load_certificate_file, parse_certificate, CertificateInfo, CertificateSubject,
    X509Certificate,
};
pub use error::{PkiError, Result};
