use thiserror::Error;

/// Key模块的错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 密钥相关错误
    #[error("Key error: {0}")]
    KeyError(String),

    /// 签名相关错误
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// 密钥导入错误
    #[error("Key import error: {0}")]
    ImportError(String),

    /// 密钥导出错误
    #[error("Key export error: {0}")]
    ExportError(String),

    /// 不支持的算法
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("PKCS8 error: {0}")]
    Pkcs8Error(#[from] pkcs8::Error),

    #[error("SPKI error: {0}")]
    SpkiError(#[from] spki::Error),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
