use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use spki::{der::Any, AlgorithmIdentifierOwned};

use super::{Algorithm, ExportablePrivateKey, Key, KeySign};
use crate::{
    error::{Error, Result},
    hash::DigestAlgorithm,
};

// ============================================================================
// Core Key Structure
// ============================================================================

/// RSA signing key (PKCS#1 v1.5)
///
/// # Examples
///
/// ```no_run
/// use sigil_key::{DigestAlgorithm, KeySign, RsaKey};
///
/// let key = RsaKey::generate_2048().unwrap();
/// let signature = key.sign(b"Hello, World!", DigestAlgorithm::Sha256).unwrap();
/// ```
pub struct RsaKey {
    inner: RsaPrivateKey,
}

impl From<RsaPrivateKey> for RsaKey {
    fn from(value: RsaPrivateKey) -> Self {
        Self { inner: value }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RsaKey {
    /// Generate a new RSA key pair with specified bit length
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let inner = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| Error::KeyError(format!("RSA-{bits} generation failed: {e}")))?;
        Ok(Self { inner })
    }

    /// Generate a new 2048-bit RSA key pair
    pub fn generate_2048() -> Result<Self> {
        Self::generate(2048)
    }

    /// Generate a new 3072-bit RSA key pair
    pub fn generate_3072() -> Result<Self> {
        Self::generate(3072)
    }

    /// Import from PKCS8 PEM format
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let inner = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::ImportError(format!("RSA PKCS8 PEM import failed: {e}")))?;
        Ok(Self { inner })
    }

    /// Import from PKCS8 DER format
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let inner = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::ImportError(format!("RSA PKCS8 DER import failed: {e}")))?;
        Ok(Self { inner })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    /// Get RSA key size in bits
    pub fn size_bits(&self) -> usize {
        rsa::traits::PublicKeyParts::size(&self.inner) * 8
    }
}

pub(crate) fn pkcs1v15_scheme(digest: DigestAlgorithm) -> Pkcs1v15Sign {
    match digest {
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl Key for RsaKey {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Rsa
    }

    fn spki_der(&self) -> Result<Vec<u8>> {
        let der = self.inner.to_public_key().to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }
}

impl KeySign for RsaKey {
    fn sign(&self, message: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        let hashed = digest.hash(message);
        self.inner
            .sign_with_rng(&mut rng, pkcs1v15_scheme(digest), &hashed)
            .map_err(|e| Error::SignatureError(format!("RSA signing failed: {e}")))
    }

    fn signature_algorithm_id(&self, _digest: DigestAlgorithm) -> AlgorithmIdentifierOwned {
        // CMS carries the digest separately, so the bare rsaEncryption OID is used
        AlgorithmIdentifierOwned {
            oid: const_oid::db::rfc5912::RSA_ENCRYPTION,
            parameters: Some(Any::null()),
        }
    }
}

impl ExportablePrivateKey for RsaKey {
    fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self
            .inner
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::ExportError(format!("RSA PKCS8 PEM export failed: {e}")))?;
        Ok(pem.to_string())
    }

    fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let der = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| Error::ExportError(format!("RSA PKCS8 DER export failed: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }
}
