use colored::Colorize;
use sigil_cms::{SignedEnvelope, VerificationResult, Verifier};

use super::read_input;
use crate::error::{CliError, CliResult};

pub fn handle(file: String, signature: String) -> CliResult<()> {
    println!("{}", format!("验证签名: {}", file).cyan());

    let content = read_input(&file)?;
    let envelope_bytes = read_input(&signature)?;

    match Verifier::new().verify(&content, &envelope_bytes) {
        VerificationResult::Verified => {
            println!("{} 签名有效", "✓".green().bold());
            // 验证通过说明信封可以解析
            if let Ok(signers) = SignedEnvelope::parse(&envelope_bytes).and_then(|e| e.signers()) {
                for signer in signers {
                    if let Some(cert) = signer.certificate {
                        println!("  签名者: CN={}", cert.subject.common_name);
                        if !cert.is_currently_valid() {
                            println!("{}", "  警告: 签名证书不在有效期内".yellow());
                        }
                    }
                    println!("  摘要算法: {}", signer.digest_algorithm);
                }
            }
            Ok(())
        }
        VerificationResult::Failed(reason) => {
            println!("{} 签名无效: {}", "✗".red().bold(), reason);
            Err(CliError::VerificationFailed(reason.to_string()))
        }
    }
}
