use p256::{
    ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey},
    elliptic_curve::rand_core::OsRng,
    SecretKey,
};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use spki::AlgorithmIdentifierOwned;

use super::{Algorithm, ExportablePrivateKey, Key, KeySign};
use crate::{
    error::{Error, Result},
    hash::DigestAlgorithm,
};

/// NIST P-256 ECDSA signing key
pub struct P256Key {
    inner: SecretKey,
}

impl From<SecretKey> for P256Key {
    fn from(value: SecretKey) -> Self {
        Self { inner: value }
    }
}

impl P256Key {
    /// Generate a new P-256 key pair
    pub fn generate() -> Self {
        SecretKey::random(&mut OsRng).into()
    }

    /// Import from PKCS8 PEM format
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let inner = SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::ImportError(format!("P-256 PKCS8 PEM import failed: {e}")))?;
        Ok(Self { inner })
    }

    /// Import from PKCS8 DER format
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let inner = SecretKey::from_pkcs8_der(der)
            .map_err(|e| Error::ImportError(format!("P-256 PKCS8 DER import failed: {e}")))?;
        Ok(Self { inner })
    }
}

pub(crate) fn ecdsa_signature_oid(digest: DigestAlgorithm) -> const_oid::ObjectIdentifier {
    match digest {
        DigestAlgorithm::Sha256 => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
        DigestAlgorithm::Sha384 => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
        DigestAlgorithm::Sha512 => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
    }
}

impl Key for P256Key {
    fn algorithm(&self) -> Algorithm {
        Algorithm::P256
    }

    fn spki_der(&self) -> Result<Vec<u8>> {
        let der = self.inner.public_key().to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }
}

impl KeySign for P256Key {
    /// ECDSA over the `digest` hash of `message`, DER-encoded (r, s)
    fn sign(&self, message: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        let signing_key = SigningKey::from(&self.inner);
        let prehash = digest.hash(message);
        let signature: Signature = signing_key
            .sign_prehash(&prehash)
            .map_err(|e| Error::SignatureError(format!("ECDSA signing failed: {e}")))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn signature_algorithm_id(&self, digest: DigestAlgorithm) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: ecdsa_signature_oid(digest),
            parameters: None,
        }
    }
}

impl ExportablePrivateKey for P256Key {
    fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self
            .inner
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::ExportError(format!("P-256 PKCS8 PEM export failed: {e}")))?;
        Ok(pem.to_string())
    }

    fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let der = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| Error::ExportError(format!("P-256 PKCS8 DER export failed: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }
}
