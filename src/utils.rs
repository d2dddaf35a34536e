use anyhow::Result;
use std::path::{Path, PathBuf};

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证频道根目录
///
/// 相对路径会基于当前工作目录转换为绝对路径
pub fn validate_channel_dir(path: &Path) -> Result<PathBuf> {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    if !absolute_path.exists() {
        anyhow::bail!("频道目录不存在: {}", absolute_path.display());
    }

    if !absolute_path.is_dir() {
        anyhow::bail!("频道路径不是目录: {}", absolute_path.display());
    }

    Ok(absolute_path)
}
