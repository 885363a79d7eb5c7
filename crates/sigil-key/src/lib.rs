pub mod error;
pub mod hash;
pub mod key;
pub mod verify;

pub use error::{Error, Result};
pub use hash::DigestAlgorithm;
pub use key::{
    generate_signing_key,
    util::{
        load_signing_key_from_file, load_signing_key_from_pkcs8_der,
        load_signing_key_from_pkcs8_pem,
    },
    Algorithm, Ed25519Key, ExportablePrivateKey, Key, KeySign, P256Key, RsaKey, SigningKey,
};
pub use verify::{spki_algorithm, verify_with_spki};
