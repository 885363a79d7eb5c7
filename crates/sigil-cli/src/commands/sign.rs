use std::{fs, path::PathBuf};

use colored::Colorize;
use sigil_cms::{Signer, SignerIdentity};
use sigil_key::DigestAlgorithm;

use super::read_input;
use crate::{
    error::{CliError, CliResult},
    settings::Settings,
};

/// `sign` 子命令参数
pub struct SignArgs {
    pub file: String,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub output: Option<String>,
    pub digest: Option<String>,
    pub der: bool,
    pub no_self_check: bool,
}

pub fn handle(settings: &Settings, args: SignArgs) -> CliResult<()> {
    println!("{}", format!("签名文件: {}", args.file).cyan());

    let cert_path = args
        .cert
        .map(PathBuf::from)
        .or_else(|| settings.identity.certificate.clone())
        .ok_or_else(|| CliError::InvalidInput("未指定签名证书 (--cert)".to_string()))?;
    let key_path = args
        .key
        .map(PathBuf::from)
        .or_else(|| settings.identity.private_key.clone())
        .ok_or_else(|| CliError::InvalidInput("未指定私钥 (--key)".to_string()))?;

    for path in [&cert_path, &key_path] {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
    }

    let mut options = settings.signer_options();
    if let Some(digest) = args.digest {
        options.digest = digest.parse::<DigestAlgorithm>()?;
    }
    if args.no_self_check {
        options.self_check = false;
    }

    let content = read_input(&args.file)?;
    let identity = SignerIdentity::from_files(&cert_path, &key_path)?;
    println!("  签名者: {}", identity.certificate().subject_dn());

    let envelope = Signer::with_options(options).sign(&content, &identity)?;

    let armor = settings.signing.armor && !args.der;
    let bytes = if armor {
        envelope.to_pem().into_bytes()
    } else {
        envelope.into_der()
    };

    let output = args.output.unwrap_or_else(|| format!("{}.p7s", args.file));
    fs::write(&output, &bytes)?;

    println!(
        "{} 签名已保存到: {} ({}, {} 字节)",
        "✓".green(),
        output,
        if armor { "PEM" } else { "DER" },
        bytes.len()
    );
    if !options.self_check {
        println!("{}", "  已跳过签名自检".yellow());
    }

    Ok(())
}
