use std::{fs, path::Path};

use colored::Colorize;
use sigil_key::{generate_signing_key, Algorithm, ExportablePrivateKey};
use sigil_pki::{create_self_signed_certificate, export_certificate, CertificateSubject};

use crate::error::{CliError, CliResult};

/// 生成 `<name>_private.pem` 与 `<name>_cert.pem`
pub fn handle(
    name: String,
    algorithm: String,
    cn: Option<String>,
    days: u32,
    output: Option<String>,
) -> CliResult<()> {
    let algorithm: Algorithm = algorithm.parse()?;
    if days == 0 {
        return Err(CliError::InvalidInput("有效期必须大于 0 天".to_string()));
    }

    println!("{}", format!("生成 {} 密钥对...", algorithm).cyan());
    let key = generate_signing_key(algorithm)?;

    let output_dir = output.unwrap_or_else(|| ".".to_string());
    let output_path = Path::new(&output_dir);
    if !output_path.exists() {
        fs::create_dir_all(output_path)?;
    }

    let private_key_path = output_path.join(format!("{}_private.pem", name));
    fs::write(&private_key_path, key.to_pkcs8_pem()?)?;
    println!("{} 私钥已保存到: {:?}", "✓".green(), private_key_path);

    let subject = CertificateSubject::new(cn.unwrap_or_else(|| name.clone()));
    let cert = create_self_signed_certificate(key.as_ref(), &subject, days)?;
    let cert_path = output_path.join(format!("{}_cert.pem", name));
    fs::write(&cert_path, export_certificate(&cert, "PEM")?)?;
    println!("{} 证书已保存到: {:?}", "✓".green(), cert_path);

    println!();
    println!("{}", "证书信息:".cyan());
    println!("  主体: {}", cert.subject_dn());
    println!("  算法: {}", algorithm);
    println!("  序列号: {}", cert.info.serial_number);
    println!("  有效期至: {}", cert.info.not_after);
    println!("  公钥指纹: {}", &cert.info.spki_fingerprint[..16]);

    Ok(())
}
