use ed25519_dalek::{
    pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey},
    Signer, SigningKey,
};
use pkcs8::LineEnding;
use rand::rngs::OsRng;
use spki::AlgorithmIdentifierOwned;

use super::{Algorithm, ExportablePrivateKey, Key, KeySign};
use crate::{
    error::{Error, Result},
    hash::DigestAlgorithm,
};

/// Ed25519 signing key (PureEdDSA)
pub struct Ed25519Key {
    inner: SigningKey,
}

impl From<SigningKey> for Ed25519Key {
    fn from(value: SigningKey) -> Self {
        Self { inner: value }
    }
}

impl Ed25519Key {
    pub fn generate() -> Self {
        SigningKey::generate(&mut OsRng).into()
    }

    pub fn from_raw_seed(seed: &[u8; 32]) -> Self {
        SigningKey::from_bytes(seed).into()
    }

    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let inner = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::ImportError(format!("Ed25519 PKCS8 PEM import failed: {e}")))?;
        Ok(Self { inner })
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let inner = SigningKey::from_pkcs8_der(der)
            .map_err(|e| Error::ImportError(format!("Ed25519 PKCS8 DER import failed: {e}")))?;
        Ok(Self { inner })
    }
}

impl Key for Ed25519Key {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ed25519
    }

    fn spki_der(&self) -> Result<Vec<u8>> {
        let der = self.inner.verifying_key().to_public_key_der()?;
        Ok(der.as_bytes().to_vec())
    }
}

impl KeySign for Ed25519Key {
    /// Signs `message` directly; `digest` plays no part in the signature itself.
    fn sign(&self, message: &[u8], _digest: DigestAlgorithm) -> Result<Vec<u8>> {
        Ok(self.inner.sign(message).to_bytes().to_vec())
    }

    fn signature_algorithm_id(&self, _digest: DigestAlgorithm) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: const_oid::db::rfc8410::ID_ED_25519,
            parameters: None,
        }
    }

    // RFC 8419: Ed25519 in CMS uses SHA-512 for the message digest attribute
    fn digest_for(&self, _requested: DigestAlgorithm) -> DigestAlgorithm {
        DigestAlgorithm::Sha512
    }
}

impl ExportablePrivateKey for Ed25519Key {
    fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self
            .inner
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::ExportError(format!("Ed25519 PKCS8 PEM export failed: {e}")))?;
        Ok(pem.to_string())
    }

    fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let der = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| Error::ExportError(format!("Ed25519 PKCS8 DER export failed: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }
}
