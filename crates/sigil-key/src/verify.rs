//! Public-key signature verification against SubjectPublicKeyInfo DER.

use ed25519_dalek::Verifier as _;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use pkcs8::DecodePublicKey;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoRef};

use crate::{
    error::{Error, Result},
    hash::DigestAlgorithm,
    key::{p256::ecdsa_signature_oid, rsa::pkcs1v15_scheme, Algorithm},
};

/// Identify the key algorithm of an SPKI DER blob.
pub fn spki_algorithm(spki_der: &[u8]) -> Result<Algorithm> {
    let spki = SubjectPublicKeyInfoRef::try_from(spki_der)?;
    let oid = spki.algorithm.oid;

    if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
        Ok(Algorithm::Rsa)
    } else if oid == const_oid::db::rfc8410::ID_ED_25519 {
        Ok(Algorithm::Ed25519)
    } else if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
        let curve = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::UnsupportedAlgorithm(format!("EC key without curve: {e}")))?;
        if curve == const_oid::db::rfc5912::SECP_256_R_1 {
            Ok(Algorithm::P256)
        } else {
            Err(Error::UnsupportedAlgorithm(format!("EC curve OID: {curve}")))
        }
    } else {
        Err(Error::UnsupportedAlgorithm(format!("public key OID: {oid}")))
    }
}

/// Verify `signature` over `message` with the public key in `spki_der`.
///
/// `Ok(false)` means the signature does not match; `Err` means the key or
/// the signature algorithm cannot be used at all.
pub fn verify_with_spki(
    spki_der: &[u8],
    signature_algorithm: &AlgorithmIdentifierOwned,
    digest: DigestAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let algorithm = spki_algorithm(spki_der)?;
    check_signature_algorithm(algorithm, signature_algorithm, digest)?;

    match algorithm {
        Algorithm::Rsa => {
            let public_key = rsa::RsaPublicKey::from_public_key_der(spki_der)?;
            let hashed = digest.hash(message);
            Ok(public_key
                .verify(pkcs1v15_scheme(digest), &hashed, signature)
                .is_ok())
        }
        Algorithm::P256 => {
            let verifying_key = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der)?;
            let Ok(signature) = p256::ecdsa::Signature::from_der(signature) else {
                return Ok(false);
            };
            let prehash = digest.hash(message);
            Ok(verifying_key.verify_prehash(&prehash, &signature).is_ok())
        }
        Algorithm::Ed25519 => {
            let verifying_key = ed25519_dalek::VerifyingKey::from_public_key_der(spki_der)?;
            let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(verifying_key.verify(message, &signature).is_ok())
        }
    }
}

fn check_signature_algorithm(
    algorithm: Algorithm,
    signature_algorithm: &AlgorithmIdentifierOwned,
    digest: DigestAlgorithm,
) -> Result<()> {
    use const_oid::db::rfc5912::{
        RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
        SHA_512_WITH_RSA_ENCRYPTION,
    };

    let oid = signature_algorithm.oid;
    let accepted = match algorithm {
        Algorithm::Rsa => {
            let with_digest = match digest {
                DigestAlgorithm::Sha256 => SHA_256_WITH_RSA_ENCRYPTION,
                DigestAlgorithm::Sha384 => SHA_384_WITH_RSA_ENCRYPTION,
                DigestAlgorithm::Sha512 => SHA_512_WITH_RSA_ENCRYPTION,
            };
            oid == RSA_ENCRYPTION || oid == with_digest
        }
        Algorithm::P256 => oid == ecdsa_signature_oid(digest),
        Algorithm::Ed25519 => oid == const_oid::db::rfc8410::ID_ED_25519,
    };

    if accepted {
        Ok(())
    } else {
        Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm {oid} with {algorithm} key and {digest}"
        )))
    }
}
