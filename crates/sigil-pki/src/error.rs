use thiserror::Error;

/// PKI 模块的错误类型
#[derive(Error, Debug)]
pub enum PkiError {
    /// 解析错误
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 导入错误
    #[error("Import error: {0}")]
    ImportError(String),

    /// 导出错误
    #[error("Export error: {0}")]
    ExportError(String),

    /// 证书生成错误
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// 密钥错误
    #[error("Key error: {0}")]
    KeyError(#[from] sigil_key::Error),

    /// DER 编码错误
    #[error("DER error: {0}")]
    DerError(#[from] der::Error),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, PkiError>;
