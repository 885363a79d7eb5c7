use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key error: {0}")]
    Key(#[from] sigil_key::Error),

    #[error("Certificate error: {0}")]
    Pki(#[from] sigil_pki::PkiError),

    #[error("Signing error: {0}")]
    Sign(#[from] sigil_cms::SignError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] sigil_cms::EnvelopeError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

pub type CliResult<T> = Result<T, CliError>;
