//! Sigil 分离式签名命令行工具

mod commands;
mod error;
mod logging;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use error::CliResult;
use settings::Settings;

#[derive(Parser)]
#[command(name = "sigil")]
#[command(about = "Sigil - 分离式 CMS 数字签名与验证")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "sigil.toml")]
    config: PathBuf,

    /// 输出更多日志（-v debug，-vv trace）
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成私钥与自签名证书
    Generate {
        /// 密钥标识，用作文件名前缀
        #[arg(short, long)]
        name: String,

        /// 密钥算法 (rsa, p256, ed25519)
        #[arg(short, long, default_value = "p256")]
        algorithm: String,

        /// 证书通用名称，默认与密钥标识相同
        #[arg(long)]
        cn: Option<String>,

        /// 证书有效期（天）
        #[arg(short, long, default_value_t = 365)]
        days: u32,

        /// 输出目录
        #[arg(short, long)]
        output: Option<String>,
    },

    /// 对文件生成分离式签名
    Sign {
        /// 要签名的文件路径
        #[arg(short, long)]
        file: String,

        /// 签名证书，默认取配置文件
        #[arg(long)]
        cert: Option<String>,

        /// 私钥文件路径，默认取配置文件
        #[arg(short, long)]
        key: Option<String>,

        /// 签名输出文件，默认 <file>.p7s
        #[arg(short, long)]
        output: Option<String>,

        /// 摘要算法 (sha256, sha384, sha512)
        #[arg(long)]
        digest: Option<String>,

        /// 输出 DER 而不是 PEM
        #[arg(long)]
        der: bool,

        /// 跳过签名后的自检
        #[arg(long)]
        no_self_check: bool,
    },

    /// 验证分离式签名
    Verify {
        /// 原始文件路径
        #[arg(short, long)]
        file: String,

        /// 签名文件路径
        #[arg(short, long)]
        signature: String,
    },

    /// 查看签名文件内容
    Inspect {
        /// 签名文件路径
        #[arg(short, long)]
        signature: String,
    },

    /// 计算文件哈希
    Hash {
        /// 要计算哈希的文件
        #[arg(short, long)]
        file: String,

        /// 哈希算法 (sha256, sha384, sha512)
        #[arg(short, long, default_value = "sha256")]
        algorithm: String,
    },
}

fn run(cli: Cli) -> CliResult<()> {
    let settings = Settings::load(&cli.config)?;
    logging::init(&settings.log.level, cli.verbose);
    tracing::debug!(config = %cli.config.display(), "settings loaded");

    match cli.command {
        Commands::Generate {
            name,
            algorithm,
            cn,
            days,
            output,
        } => commands::generate::handle(name, algorithm, cn, days, output),
        Commands::Sign {
            file,
            cert,
            key,
            output,
            digest,
            der,
            no_self_check,
        } => commands::sign::handle(
            &settings,
            commands::sign::SignArgs {
                file,
                cert,
                key,
                output,
                digest,
                der,
                no_self_check,
            },
        ),
        Commands::Verify { file, signature } => commands::verify::handle(file, signature),
        Commands::Inspect { signature } => commands::inspect::handle(signature),
        Commands::Hash { file, algorithm } => commands::hash::handle(file, algorithm),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "✗".red());
            ExitCode::FAILURE
        }
    }
}
