pub mod cert_utils;
pub mod types;

// 重新导出常用类型和函数
pub use cert_utils::{
    create_self_signed_certificate, export_certificate, import_certificate,
    load_certificate_file, parse_certificate,
};
pub use types::{CertificateInfo, CertificateSubject, X509Certificate};
