//! # Sigil - 分离式数字签名
//!
//! 对任意字节生成 CMS/PKCS#7 分离式签名，并在之后将原文与签名重新配对验证。
//!
//! ## 模块
//!
//! - `sigil_key` - 签名密钥与摘要算法
//! - `sigil_pki` - X.509 签名证书
//! - `sigil_cms` - 签名信封、签名器与验证器

pub use sigil_cms;
pub use sigil_key;
pub use sigil_pki;

pub use sigil_cms::{
    FailureReason, SignedEnvelope, Signer, SignerIdentity, SignerOptions, VerificationResult,
    Verifier,
};
