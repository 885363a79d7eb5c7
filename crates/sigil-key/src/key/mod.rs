pub mod ed25519;
pub mod p256;
pub mod rsa;
pub mod util;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use spki::AlgorithmIdentifierOwned;

pub use self::{ed25519::Ed25519Key, p256::P256Key, rsa::RsaKey};
use crate::{
    error::{Error, Result},
    hash::DigestAlgorithm,
};

/// Signing key algorithms understood by sigil
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Rsa,
    P256,
    Ed25519,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Rsa => "RSA",
            Algorithm::P256 => "ECDSA P-256",
            Algorithm::Ed25519 => "Ed25519",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rsa" => Ok(Algorithm::Rsa),
            "p256" | "p-256" | "ecdsa" => Ok(Algorithm::P256),
            "ed25519" => Ok(Algorithm::Ed25519),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

// ============================================================================
// Key traits
// ============================================================================

/// Common behaviour of every private key.
pub trait Key: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Public half of the key as SubjectPublicKeyInfo DER
    fn spki_der(&self) -> Result<Vec<u8>>;

    fn fingerprint_sha256_spki(&self) -> Result<Vec<u8>> {
        Ok(Sha256::digest(self.spki_der()?).to_vec())
    }

    /// First 16 bytes of the SPKI fingerprint
    fn key_id(&self) -> Result<Vec<u8>> {
        let mut fingerprint = self.fingerprint_sha256_spki()?;
        fingerprint.truncate(16);
        Ok(fingerprint)
    }

    fn key_id_hex(&self) -> Result<String> {
        Ok(hex::encode(self.key_id()?))
    }
}

/// Keys able to produce signatures.
pub trait KeySign: Key {
    /// Sign `message`. Hash-then-sign algorithms hash it with `digest`
    /// first; Ed25519 signs the message as is.
    fn sign(&self, message: &[u8], digest: DigestAlgorithm) -> Result<Vec<u8>>;

    /// AlgorithmIdentifier describing signatures made with `digest`
    fn signature_algorithm_id(&self, digest: DigestAlgorithm) -> AlgorithmIdentifierOwned;

    /// Digest algorithm this key actually pairs with when `requested` is asked for.
    fn digest_for(&self, requested: DigestAlgorithm) -> DigestAlgorithm {
        requested
    }
}

pub trait ExportablePrivateKey {
    fn to_pkcs8_pem(&self) -> Result<String>;

    fn to_pkcs8_der(&self) -> Result<Vec<u8>>;
}

/// Object-safe umbrella over a usable private signing key.
pub trait SigningKey: KeySign + ExportablePrivateKey {}

impl<T: KeySign + ExportablePrivateKey> SigningKey for T {}

/// Generate a fresh key of the given algorithm.
pub fn generate_signing_key(algorithm: Algorithm) -> Result<Box<dyn SigningKey>> {
    Ok(match algorithm {
        Algorithm::Rsa => Box::new(RsaKey::generate_2048()?),
        Algorithm::P256 => Box::new(P256Key::generate()),
        Algorithm::Ed25519 => Box::new(Ed25519Key::generate()),
    })
}
