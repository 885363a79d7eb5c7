use colored::Colorize;
use sigil_key::DigestAlgorithm;

use super::read_input;
use crate::error::CliResult;

pub fn handle(file: String, algorithm: String) -> CliResult<()> {
    println!("{}", format!("计算文件哈希: {}", file).cyan());

    let digest: DigestAlgorithm = algorithm.parse()?;
    let data = read_input(&file)?;
    println!("  算法: {}", digest);

    let hash = digest.hash_hex(&data);

    println!();
    println!("{} {}", "哈希值:".green().bold(), hash);
    println!("{} {}", "简短版:".cyan(), &hash[..16]);

    Ok(())
}
