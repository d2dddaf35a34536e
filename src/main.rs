use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use chat_archive_localizer::config::Cli;
use chat_archive_localizer::fetcher::Fetcher;
use chat_archive_localizer::source::HttpSource;
use chat_archive_localizer::stats::{format_duration, print_walk_report};
use chat_archive_localizer::store::FsAssetStore;
use chat_archive_localizer::utils::{init_logging, validate_channel_dir};
use chat_archive_localizer::walker::walk_and_rewrite;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 验证频道目录
    let channel_dir = validate_channel_dir(&cli.channel_dir)?;
    let config = cli.to_config();

    info!("🚀 开始本地化频道附件");
    info!("📂 频道目录: {}", channel_dir.display());
    info!("🔗 引用基础路径: {}", config.base_path());
    info!("📄 输出文档: {}", config.output_file_name());
    if !config.check_status() {
        warn!("⚠️  已关闭状态码校验，错误页面也会被保存为附件");
    }

    let source = HttpSource::new(config.request_timeout(), config.check_status())?;
    let fetcher = Fetcher::new(FsAssetStore::new(), source);

    let report = match walk_and_rewrite(&channel_dir, &config, &fetcher).await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ 本地化失败: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "✅ 处理完成: {} 个频道成功, {} 个失败, 耗时 {}",
        report.succeeded(),
        report.failed(),
        format_duration(std::time::Duration::from_millis(report.elapsed_ms))
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if cli.stats || cli.verbose {
        print_walk_report(&report);
    }

    if let Err(e) = report.into_result() {
        error!("❌ {}", e);
        std::process::exit(1);
    }

    Ok(())
}
