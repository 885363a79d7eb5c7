use tracing_subscriber::EnvFilter;

/// 安装 stderr 上的 fmt 订阅器
///
/// `RUST_LOG` 优先；否则 `-v` 为 debug，`-vv` 为 trace，再否则使用配置中的级别。
pub fn init(configured_level: &str, verbose: u8) {
    let level = match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
