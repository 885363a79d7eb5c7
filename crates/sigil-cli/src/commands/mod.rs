pub mod generate;
pub mod hash;
pub mod inspect;
pub mod sign;
pub mod verify;

use std::{fs, path::Path};

use crate::error::{CliError, CliResult};

/// 读取输入文件，不存在或为目录时报错
pub(crate) fn read_input(path: &str) -> CliResult<Vec<u8>> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(CliError::FileNotFound(path.to_string()));
    }
    if p.is_dir() {
        return Err(CliError::InvalidInput(format!("{path} 是目录")));
    }

    let data = fs::read(p)?;
    println!("  文件大小: {} 字节", data.len());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_input_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let result = read_input(missing.to_str().unwrap());
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[test]
    fn test_read_input_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_input(dir.path().to_str().unwrap());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(read_input(path.to_str().unwrap()).unwrap(), b"abc");
    }
}
