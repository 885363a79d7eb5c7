use std::sync::Arc;

use cms::{
    cert::CertificateChoices,
    content_info::ContentInfo,
    signed_data::{CertificateSet, SignedData, SignerInfos},
};
use const_oid::db::{rfc5911::ID_SIGNED_DATA, rfc5912};
use der::{
    asn1::{OctetString, SetOfVec},
    Any, Encode,
};
use sigil_cms::{
    FailureReason, SignError, SignedEnvelope, Signer, SignerIdentity, SignerOptions,
    VerificationResult, Verifier,
};
use sigil_key::{
    generate_signing_key, Algorithm, DigestAlgorithm, ExportablePrivateKey, Key, KeySign,
    P256Key,
};
use sigil_pki::{create_self_signed_certificate, CertificateSubject};
use spki::AlgorithmIdentifierOwned;

fn identity(algorithm: Algorithm, common_name: &str) -> SignerIdentity {
    let key = generate_signing_key(algorithm).unwrap();
    let cert =
        create_self_signed_certificate(key.as_ref(), &CertificateSubject::new(common_name), 30)
            .unwrap();
    SignerIdentity::new(cert, key).unwrap()
}

fn reencode(signed_data: &SignedData) -> Vec<u8> {
    ContentInfo {
        content_type: ID_SIGNED_DATA,
        content: Any::encode_from(signed_data).unwrap(),
    }
    .to_der()
    .unwrap()
}

fn failure(result: VerificationResult) -> FailureReason {
    match result {
        VerificationResult::Failed(reason) => reason,
        VerificationResult::Verified => panic!("expected verification to fail"),
    }
}

#[test]
fn test_round_trip_p256_and_ed25519() {
    let content = b"release-1.2.3.tar.gz contents";
    let verifier = Verifier::new();

    for algorithm in [Algorithm::P256, Algorithm::Ed25519] {
        let identity = identity(algorithm, "Round Trip");
        let envelope = Signer::new().sign(content, &identity).unwrap();
        assert_eq!(
            verifier.verify(content, envelope.as_der()),
            VerificationResult::Verified,
            "{algorithm}"
        );
    }
}

#[test]
fn test_round_trip_rsa() {
    let identity = identity(Algorithm::Rsa, "RSA Signer");
    let content = b"rsa signed content";

    for digest in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha512] {
        let signer = Signer::with_options(SignerOptions {
            digest,
            ..Default::default()
        });
        let envelope = signer.sign(content, &identity).unwrap();
        assert!(Verifier::new().verify(content, envelope.as_der()).is_verified());

        // shaXWithRSAEncryption is accepted in place of rsaEncryption
        let mut signed_data = envelope.signed_data().unwrap();
        let mut infos: Vec<_> = signed_data.signer_infos.0.iter().cloned().collect();
        infos[0].signature_algorithm = AlgorithmIdentifierOwned {
            oid: match digest {
                DigestAlgorithm::Sha256 => rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                _ => rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            },
            parameters: Some(Any::null()),
        };
        signed_data.signer_infos = SignerInfos::try_from(infos).unwrap();
        assert!(Verifier::new()
            .verify(content, &reencode(&signed_data))
            .is_verified());
    }
}

#[test]
fn test_ed25519_records_sha512() {
    let identity = identity(Algorithm::Ed25519, "Ed");
    let envelope = Signer::new().sign(b"data", &identity).unwrap();

    let signers = envelope.signers().unwrap();
    assert_eq!(signers[0].digest_algorithm, "SHA-512");
    assert_eq!(signers[0].signature_algorithm, "id-Ed25519");
}

#[test]
fn test_empty_content() {
    let identity = identity(Algorithm::P256, "Empty");
    let envelope = Signer::new().sign(b"", &identity).unwrap();

    assert!(Verifier::new().verify(b"", envelope.as_der()).is_verified());
    assert_eq!(
        failure(Verifier::new().verify(b"\0", envelope.as_der())),
        FailureReason::ContentMismatch
    );
}

#[test]
fn test_tampered_content_is_rejected() {
    let identity = identity(Algorithm::P256, "Tamper");
    let content = b"the quick brown fox".to_vec();
    let envelope = Signer::new().sign(&content, &identity).unwrap();
    let verifier = Verifier::new();

    let mut flipped = content.clone();
    flipped[4] ^= 0x01;
    let mut extended = content.clone();
    extended.push(b'!');
    let truncated = &content[..content.len() - 1];

    for tampered in [&flipped[..], &extended[..], truncated] {
        assert_eq!(
            failure(verifier.verify(tampered, envelope.as_der())),
            FailureReason::ContentMismatch
        );
    }
}

#[test]
fn test_swapped_certificate_is_rejected() {
    let signer = identity(Algorithm::P256, "Genuine");
    let stranger = identity(Algorithm::P256, "Stranger");
    let envelope = Signer::new().sign(b"payload", &signer).unwrap();

    let mut signed_data = envelope.signed_data().unwrap();
    signed_data.certificates = Some(
        CertificateSet::try_from(vec![CertificateChoices::Certificate(
            stranger.certificate().certificate().clone(),
        )])
        .unwrap(),
    );

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", &reencode(&signed_data))),
        FailureReason::SignatureInvalid(_)
    ));
}

#[test]
fn test_impostor_certificate_with_same_issuer_and_serial() {
    let signer = identity(Algorithm::P256, "Genuine");
    let stranger = identity(Algorithm::P256, "Stranger");
    let envelope = Signer::new().sign(b"payload", &signer).unwrap();

    let genuine = signer.certificate().certificate();
    let mut impostor = stranger.certificate().certificate().clone();
    impostor.tbs_certificate.issuer = genuine.tbs_certificate.issuer.clone();
    impostor.tbs_certificate.serial_number = genuine.tbs_certificate.serial_number.clone();

    let mut signed_data = envelope.signed_data().unwrap();
    signed_data.certificates = Some(
        CertificateSet::try_from(vec![CertificateChoices::Certificate(impostor)]).unwrap(),
    );

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", &reencode(&signed_data))),
        FailureReason::SignatureInvalid(_)
    ));
}

#[test]
fn test_missing_certificate_is_rejected() {
    let identity = identity(Algorithm::Ed25519, "No Cert");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();

    let mut signed_data = envelope.signed_data().unwrap();
    signed_data.certificates = None;

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", &reencode(&signed_data))),
        FailureReason::SignatureInvalid(_)
    ));
}

#[test]
fn test_multiple_signers_are_malformed() {
    let first = identity(Algorithm::P256, "First");
    let second = identity(Algorithm::P256, "Second");
    let a = Signer::new().sign(b"payload", &first).unwrap();
    let b = Signer::new().sign(b"payload", &second).unwrap();

    let mut signed_data = a.signed_data().unwrap();
    let infos: Vec<_> = signed_data
        .signer_infos
        .0
        .iter()
        .chain(b.signed_data().unwrap().signer_infos.0.iter())
        .cloned()
        .collect();
    signed_data.signer_infos = SignerInfos::try_from(infos).unwrap();

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", &reencode(&signed_data))),
        FailureReason::MalformedEnvelope(_)
    ));
}

#[test]
fn test_unknown_digest_algorithm_is_malformed() {
    let identity = identity(Algorithm::P256, "Digest");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();

    let mut signed_data = envelope.signed_data().unwrap();
    let mut infos: Vec<_> = signed_data.signer_infos.0.iter().cloned().collect();
    infos[0].digest_alg = AlgorithmIdentifierOwned {
        oid: rfc5912::ID_SHA_1,
        parameters: None,
    };
    signed_data.signer_infos = SignerInfos::try_from(infos).unwrap();

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", &reencode(&signed_data))),
        FailureReason::MalformedEnvelope(_)
    ));
}

#[test]
fn test_signer_digest_must_be_listed_in_signed_data() {
    let identity = identity(Algorithm::P256, "Digest Set");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();

    let mut signed_data = envelope.signed_data().unwrap();
    signed_data.digest_algorithms = SetOfVec::try_from(vec![AlgorithmIdentifierOwned {
        oid: rfc5912::ID_SHA_512,
        parameters: None,
    }])
    .unwrap();

    match failure(Verifier::new().verify(b"payload", &reencode(&signed_data))) {
        FailureReason::MalformedEnvelope(message) => {
            assert!(message.contains("digestAlgorithms"), "{message}")
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

/// Length of a DER tag+length header (single-byte tags only).
fn header_len(tlv: &[u8]) -> usize {
    if tlv[1] < 0x80 {
        2
    } else {
        2 + usize::from(tlv[1] & 0x7f)
    }
}

/// Re-encode an envelope the way streaming encoders do: ContentInfo, its
/// explicit [0] and SignedData all with indefinite lengths.
fn streamed_ber(der: &[u8]) -> Vec<u8> {
    let body = &der[header_len(der)..];
    let (oid, explicit) = body.split_at(2 + usize::from(body[1]));
    let signed_data = &explicit[header_len(explicit)..];
    let signed_data_body = &signed_data[header_len(signed_data)..];

    let mut ber = vec![0x30, 0x80];
    ber.extend_from_slice(oid);
    ber.extend_from_slice(&[0xa0, 0x80, 0x30, 0x80]);
    ber.extend_from_slice(signed_data_body);
    ber.extend_from_slice(&[0x00; 6]);
    ber
}

#[test]
fn test_ber_envelope_is_accepted() {
    let identity = identity(Algorithm::P256, "Streaming");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();
    let ber = streamed_ber(envelope.as_der());
    assert_eq!(&ber[..2], &[0x30, 0x80]);

    let verifier = Verifier::new();
    assert_eq!(verifier.verify(b"payload", &ber), VerificationResult::Verified);
    assert_eq!(
        failure(verifier.verify(b"paylaod", &ber)),
        FailureReason::ContentMismatch
    );

    // parsing stores the DER form
    let parsed = SignedEnvelope::parse(&ber).unwrap();
    assert_eq!(parsed, envelope);

    let mut truncated = ber.clone();
    truncated.truncate(ber.len() - 2);
    assert!(matches!(
        failure(verifier.verify(b"payload", &truncated)),
        FailureReason::MalformedEnvelope(_)
    ));
}

#[test]
fn test_attached_content_must_match() {
    let identity = identity(Algorithm::P256, "Attached");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();

    let mut signed_data = envelope.signed_data().unwrap();
    signed_data.encap_content_info.econtent =
        Some(Any::encode_from(&OctetString::new(b"payload".to_vec()).unwrap()).unwrap());
    let attached = reencode(&signed_data);

    let verifier = Verifier::new();
    assert!(verifier.verify(b"payload", &attached).is_verified());
    assert!(!SignedEnvelope::from_der(&attached).unwrap().is_detached().unwrap());

    signed_data.encap_content_info.econtent =
        Some(Any::encode_from(&OctetString::new(b"other".to_vec()).unwrap()).unwrap());
    assert_eq!(
        failure(verifier.verify(b"payload", &reencode(&signed_data))),
        FailureReason::ContentMismatch
    );
}

#[test]
fn test_verification_is_deterministic() {
    let identity = identity(Algorithm::Ed25519, "Repeat");
    let envelope = Signer::new().sign(b"payload", &identity).unwrap();
    let verifier = Verifier::new();

    let good: Vec<_> = (0..5)
        .map(|_| verifier.verify(b"payload", envelope.as_der()))
        .collect();
    assert!(good.iter().all(VerificationResult::is_verified));

    let bad: Vec<_> = (0..5)
        .map(|_| verifier.verify(b"paylaod", envelope.as_der()))
        .collect();
    assert!(bad.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_concurrent_signing_with_shared_identity() {
    let identity = Arc::new(identity(Algorithm::P256, "Shared"));
    let signer = Arc::new(Signer::new());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let identity = Arc::clone(&identity);
            let signer = Arc::clone(&signer);
            std::thread::spawn(move || {
                let content = format!("document #{i}").into_bytes();
                let envelope = signer.sign(&content, &identity).unwrap();
                (content, envelope)
            })
        })
        .collect();

    for handle in handles {
        let (content, envelope) = handle.join().unwrap();
        assert!(Verifier::new().verify(&content, envelope.as_der()).is_verified());
    }
}

// ============================================================================
// Self-check
// ============================================================================

/// Delegates to a real key but signs the wrong bytes.
struct MisbehavingKey(P256Key);

impl Key for MisbehavingKey {
    fn algorithm(&self) -> Algorithm {
        self.0.algorithm()
    }

    fn spki_der(&self) -> sigil_key::Result<Vec<u8>> {
        self.0.spki_der()
    }
}

impl KeySign for MisbehavingKey {
    fn sign(&self, _message: &[u8], digest: DigestAlgorithm) -> sigil_key::Result<Vec<u8>> {
        self.0.sign(b"something else entirely", digest)
    }

    fn signature_algorithm_id(&self, digest: DigestAlgorithm) -> AlgorithmIdentifierOwned {
        self.0.signature_algorithm_id(digest)
    }
}

impl ExportablePrivateKey for MisbehavingKey {
    fn to_pkcs8_pem(&self) -> sigil_key::Result<String> {
        self.0.to_pkcs8_pem()
    }

    fn to_pkcs8_der(&self) -> sigil_key::Result<Vec<u8>> {
        self.0.to_pkcs8_der()
    }
}

fn misbehaving_identity() -> SignerIdentity {
    let key = P256Key::generate();
    let cert =
        create_self_signed_certificate(&key, &CertificateSubject::new("Broken"), 30).unwrap();
    SignerIdentity::new(cert, Box::new(MisbehavingKey(key))).unwrap()
}

#[test]
fn test_self_check_refuses_broken_envelope() {
    let result = Signer::new().sign(b"payload", &misbehaving_identity());
    assert!(matches!(result, Err(SignError::SigningIntegrityError(_))));
}

#[test]
fn test_without_self_check_verifier_still_catches_it() {
    let signer = Signer::with_options(SignerOptions {
        self_check: false,
        ..Default::default()
    });
    let envelope = signer.sign(b"payload", &misbehaving_identity()).unwrap();

    assert!(matches!(
        failure(Verifier::new().verify(b"payload", envelope.as_der())),
        FailureReason::SignatureInvalid(_)
    ));
}
