use std::time::Duration;

use crate::walker::{ChannelResult, WalkReport};

/// 打印处理统计
pub fn print_walk_report(report: &WalkReport) {
    let totals = report.totals();

    println!("\n📊 本地化统计报告:");
    println!("═══════════════════════════════════════");
    println!("🕐 开始时间: {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "⏱️  总耗时: {}",
        format_duration(Duration::from_millis(report.elapsed_ms))
    );

    // 频道统计
    println!("\n📁 频道统计:");
    println!("   成功: {} 个", report.succeeded());
    println!("   失败: {} 个", report.failed());
    for outcome in &report.channels {
        if let ChannelResult::Failed { error, .. } = &outcome.result {
            println!("   ❌ {}: {}", outcome.channel, error);
        }
    }

    // 文档统计
    println!("\n📄 文档统计:");
    println!("   读取行数: {}", totals.lines);
    println!("   改写行数: {}", totals.lines_rewritten);
    println!("   替换引用: {} 处", totals.references_rewritten);

    // 缓存统计
    let lookups = totals.downloaded + totals.already_present;
    if lookups > 0 {
        let hit_rate = totals.already_present as f64 / lookups as f64;
        println!("\n💾 缓存统计:");
        println!("   新下载: {} 个文件", totals.downloaded);
        println!("   已存在: {} 个文件", totals.already_present);
        println!("   命中率: {:.1}%", hit_rate * 100.0);
        println!(
            "   下载量: {} 字节 ({:.1} KB)",
            totals.bytes_downloaded,
            totals.bytes_downloaded as f64 / 1024.0
        );
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
