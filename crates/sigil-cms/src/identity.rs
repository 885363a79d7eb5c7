use std::{fmt, path::Path};

use sigil_key::{load_signing_key_from_file, load_signing_key_from_pkcs8_pem, SigningKey};
use sigil_pki::{import_certificate, load_certificate_file, X509Certificate};

use crate::error::{Result, SignError};

/// 签名者身份：证书与对应私钥
///
/// 只能通过检查过公钥一致性的构造函数创建。
pub struct SignerIdentity {
    certificate: X509Certificate,
    key: Box<dyn SigningKey>,
}

impl SignerIdentity {
    /// 组合证书与私钥，公钥不一致时返回 `InvalidIdentity`
    pub fn new(certificate: X509Certificate, key: Box<dyn SigningKey>) -> Result<Self> {
        let identity = Self { certificate, key };
        identity.ensure_consistent()?;
        Ok(identity)
    }

    /// 从 PEM/DER 证书与 PKCS#8 PEM 私钥创建
    pub fn from_pem(certificate: &[u8], private_key_pem: &str) -> Result<Self> {
        let certificate = import_certificate(certificate)
            .map_err(|e| SignError::InvalidIdentity(format!("certificate: {e}")))?;
        let key = load_signing_key_from_pkcs8_pem(private_key_pem)
            .map_err(|e| SignError::InvalidIdentity(format!("private key: {e}")))?;
        Self::new(certificate, key)
    }

    /// 从证书文件与私钥文件创建
    pub fn from_files<C: AsRef<Path>, K: AsRef<Path>>(
        certificate: C,
        private_key: K,
    ) -> Result<Self> {
        let certificate_path = certificate.as_ref();
        let key_path = private_key.as_ref();

        let certificate = load_certificate_file(certificate_path).map_err(|e| {
            SignError::InvalidIdentity(format!("{}: {e}", certificate_path.display()))
        })?;
        let key = load_signing_key_from_file(key_path)
            .map_err(|e| SignError::InvalidIdentity(format!("{}: {e}", key_path.display())))?;
        Self::new(certificate, key)
    }

    pub fn certificate(&self) -> &X509Certificate {
        &self.certificate
    }

    pub fn key(&self) -> &dyn SigningKey {
        self.key.as_ref()
    }

    /// 证书中的公钥必须与私钥一致
    pub(crate) fn ensure_consistent(&self) -> Result<()> {
        let matches = self
            .certificate
            .matches_key(self.key.as_ref())
            .map_err(|e| SignError::InvalidIdentity(e.to_string()))?;
        if matches {
            Ok(())
        } else {
            Err(SignError::InvalidIdentity(format!(
                "private key does not match certificate \"{}\"",
                self.certificate.subject_dn()
            )))
        }
    }
}

impl fmt::Debug for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerIdentity")
            .field("subject", &self.certificate.subject_dn())
            .field("algorithm", &self.key.algorithm())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sigil_key::{Ed25519Key, ExportablePrivateKey, P256Key};
    use sigil_pki::{create_self_signed_certificate, export_certificate, CertificateSubject};

    use super::*;

    #[test]
    fn test_matching_identity() {
        let key = P256Key::generate();
        let cert =
            create_self_signed_certificate(&key, &CertificateSubject::new("Signer"), 30).unwrap();

        let identity = SignerIdentity::new(cert, Box::new(key)).unwrap();
        assert_eq!(identity.certificate().info.subject.common_name, "Signer");

        // Debug 输出不含私钥
        let debug = format!("{identity:?}");
        assert!(debug.contains("CN=Signer"));
        assert!(debug.contains("P256"));
    }

    #[test]
    fn test_mismatched_identity_rejected() {
        let key = P256Key::generate();
        let cert =
            create_self_signed_certificate(&key, &CertificateSubject::new("Signer"), 30).unwrap();

        let result = SignerIdentity::new(cert, Box::new(P256Key::generate()));
        assert!(matches!(result, Err(SignError::InvalidIdentity(_))));
    }

    #[test]
    fn test_from_pem_and_files() {
        let key = Ed25519Key::generate();
        let cert =
            create_self_signed_certificate(&key, &CertificateSubject::new("Files"), 30).unwrap();
        let cert_pem = export_certificate(&cert, "PEM").unwrap();
        let key_pem = key.to_pkcs8_pem().unwrap();

        assert!(SignerIdentity::from_pem(&cert_pem, &key_pem).is_ok());

        let dir = tempfile::tempdir().unwrap();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        fs::write(&cert_path, &cert_pem).unwrap();
        fs::write(&key_path, &key_pem).unwrap();
        assert!(SignerIdentity::from_files(&cert_path, &key_path).is_ok());

        let missing = SignerIdentity::from_files(dir.path().join("nope.pem"), &key_path);
        assert!(matches!(missing, Err(SignError::InvalidIdentity(_))));
    }
}
