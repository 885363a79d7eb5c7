//! Sigil CMS - 分离式 PKCS#7 / CMS 签名
//!
//! [`Signer`] 对任意字节生成不含原文的 `SignedData` 信封，
//! [`Verifier`] 将原文与信封重新配对并给出验证结论。

pub mod attributes;
mod ber;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod signer;
pub mod verifier;

pub use envelope::{SignedEnvelope, SignerSummary};
pub use error::{EnvelopeError, Result, SignError};
pub use identity::SignerIdentity;
pub use signer::{Signer, SignerOptions};
pub use verifier::{FailureReason, VerificationResult, Verifier};
