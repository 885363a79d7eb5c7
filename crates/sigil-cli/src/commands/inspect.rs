use colored::Colorize;
use sigil_cms::SignedEnvelope;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::read_input;
use crate::error::CliResult;

pub fn handle(signature: String) -> CliResult<()> {
    println!("{}", format!("签名文件: {}", signature).cyan());

    let bytes = read_input(&signature)?;
    let envelope = SignedEnvelope::parse(&bytes)?;

    println!("  格式: {}", if bytes.starts_with(b"-----") { "PEM" } else { "DER" });
    println!(
        "  分离式: {}",
        if envelope.is_detached()? { "是" } else { "否" }
    );

    let signers = envelope.signers()?;
    println!("  签名者数量: {}", signers.len());

    for (i, signer) in signers.iter().enumerate() {
        println!();
        println!("{}", format!("签名者 #{}", i + 1).green().bold());
        println!("  标识: {}", signer.signer_id);
        println!("  摘要算法: {}", signer.digest_algorithm);
        println!("  签名算法: {}", signer.signature_algorithm);

        match signer.signing_time {
            Some(at) => {
                let at = OffsetDateTime::from(at)
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| "?".to_string());
                println!("  签名时间: {}", at);
            }
            None => println!("  签名时间: 未记录"),
        }

        match &signer.certificate {
            Some(cert) => {
                println!("  证书主体: CN={}", cert.subject.common_name);
                println!("  证书颁发者: CN={}", cert.issuer.common_name);
                println!("  序列号: {}", cert.serial_number);
                println!("  有效期: {} 至 {}", cert.not_before, cert.not_after);
                if cert.is_currently_valid() {
                    println!("  剩余天数: {}", cert.days_until_expiry());
                } else {
                    println!("{}", "  证书当前不在有效期内".yellow());
                }
            }
            None => println!("{}", "  未携带签名证书".yellow()),
        }
    }

    Ok(())
}
