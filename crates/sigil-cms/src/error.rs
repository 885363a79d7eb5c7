use thiserror::Error;

/// 签名失败的原因
#[derive(Error, Debug)]
pub enum SignError {
    /// 证书与私钥不匹配，或证书/私钥无法使用
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// 签名后自检未通过
    #[error("Signing integrity error: {0}")]
    SigningIntegrityError(String),

    /// 签名结构无法编码
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl From<der::Error> for SignError {
    fn from(e: der::Error) -> Self {
        SignError::EncodingError(e.to_string())
    }
}

/// 信封解析错误
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// PEM 外壳错误
    #[error("PEM error: {0}")]
    Pem(#[from] pem::PemError),

    /// 不支持的 PEM 标签
    #[error("Unexpected PEM label: {0}")]
    UnexpectedLabel(String),

    /// DER 解码错误
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// 结构合法但内容不符合分离签名的要求
    #[error("Malformed envelope: {0}")]
    Malformed(String),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, SignError>;
