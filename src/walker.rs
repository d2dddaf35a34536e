//! 目录遍历模块
//!
//! 对频道根目录下的每个直接子目录执行一次文档改写：
//! - 输入: <root>/<channel>/index.html
//! - 输出: <root>/<channel>/<输出文档名>
//! - 引用基础路径: <base_path>/<channel>
//!
//! 频道之间相互独立，按配置的并发数同时处理。默认情况下单个频道失败
//! 不影响其他频道，最终汇总结果；启用 fail_fast 时首个失败即中止。

// 标准库导入
use std::path::{Path, PathBuf};
use std::time::Instant;

// 第三方crate导入
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{error, info};
use walkdir::WalkDir;

// 本地模块导入
use crate::config::LocalizeConfig;
use crate::error::{LocalizeError, Result};
use crate::fetcher::Fetcher;
use crate::localize_error;
use crate::rewriter::{DocumentReport, DocumentRewriter};
use crate::source::RemoteSource;
use crate::store::AssetStore;

/// 单个频道的处理任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelExport {
    /// 子目录名
    pub name: String,
    pub input_document: PathBuf,
    pub output_document: PathBuf,
    /// 该频道引用使用的基础路径
    pub base_path: String,
}

/// 频道处理结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelResult {
    Ok(DocumentReport),
    Failed {
        error: String,
        /// 失败原因是否属于临时性网络问题，可稍后重跑
        retryable: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelOutcome {
    pub channel: String,
    #[serde(flatten)]
    pub result: ChannelResult,
}

impl ChannelOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.result, ChannelResult::Ok(_))
    }
}

/// 整次遍历的汇总报告
#[derive(Debug, Clone, Serialize)]
pub struct WalkReport {
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u64,
    pub channels: Vec<ChannelOutcome>,
}

impl WalkReport {
    pub fn succeeded(&self) -> usize {
        self.channels.iter().filter(|c| c.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.channels.len() - self.succeeded()
    }

    /// 所有成功频道的统计之和
    pub fn totals(&self) -> DocumentReport {
        let mut totals = DocumentReport::default();
        for outcome in &self.channels {
            if let ChannelResult::Ok(report) = &outcome.result {
                totals.lines += report.lines;
                totals.lines_rewritten += report.lines_rewritten;
                totals.references_rewritten += report.references_rewritten;
                totals.downloaded += report.downloaded;
                totals.already_present += report.already_present;
                totals.bytes_downloaded += report.bytes_downloaded;
            }
        }
        totals
    }

    /// 有频道失败时转换为错误
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed > 0 {
            return Err(LocalizeError::ChannelsFailed {
                failed,
                total: self.channels.len(),
            });
        }
        Ok(self)
    }
}

/// 列出频道根目录下的直接子目录（不递归），按名称排序
///
/// 输出文档名与输入文档名相同时拒绝执行，否则创建输出会截断输入。
pub fn discover_channels(root: &Path, config: &LocalizeConfig) -> Result<Vec<ChannelExport>> {
    if config.output_file_name() == config.input_file_name() {
        return Err(localize_error!(
            input_validation,
            config.output_file_name(),
            "输出文档名不能与输入文档名相同"
        ));
    }

    let mut channels = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| localize_error!(file_op, root.display(), "遍历", e))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let dir = entry.path();
        channels.push(ChannelExport {
            input_document: dir.join(config.input_file_name()),
            output_document: dir.join(config.output_file_name()),
            base_path: channel_base_path(config.base_path(), &name),
            name,
        });
    }

    Ok(channels)
}

fn channel_base_path(base_path: &str, channel: &str) -> String {
    if base_path.is_empty() {
        return channel.to_string();
    }
    format!("{}/{}", base_path.trim_end_matches('/'), channel)
}

/// 遍历频道根目录并改写每个频道的文档
pub async fn walk_and_rewrite<S: AssetStore, R: RemoteSource>(
    root: &Path,
    config: &LocalizeConfig,
    fetcher: &Fetcher<S, R>,
) -> Result<WalkReport> {
    let started_at = Local::now();
    let start = Instant::now();

    let channels = discover_channels(root, config)?;
    info!("📁 发现 {} 个频道: {}", channels.len(), root.display());

    let rewriter = DocumentRewriter::new(fetcher, config.match_mode())?;
    let rewriter = &rewriter;
    let concurrency = config.concurrent_channels();

    let mut outcomes = if config.fail_fast() {
        stream::iter(channels)
            .map(|channel| async move {
                let report = rewriter
                    .rewrite(&channel.input_document, &channel.output_document, &channel.base_path)
                    .await
                    .map_err(|e| {
                        error!("❌ 频道 {} 处理失败，中止: {}", channel.name, e);
                        e
                    })?;
                Ok::<_, LocalizeError>(ChannelOutcome {
                    channel: channel.name,
                    result: ChannelResult::Ok(report),
                })
            })
            .buffer_unordered(concurrency)
            .try_collect::<Vec<_>>()
            .await?
    } else {
        stream::iter(channels)
            .map(|channel| async move {
                let result = match rewriter
                    .rewrite(&channel.input_document, &channel.output_document, &channel.base_path)
                    .await
                {
                    Ok(report) => {
                        info!("✅ 频道 {} 完成", channel.name);
                        ChannelResult::Ok(report)
                    }
                    Err(e) => {
                        let retryable = e.is_retryable();
                        if retryable {
                            error!("❌ 频道 {} 处理失败（可重试）: {}", channel.name, e);
                        } else {
                            error!("❌ 频道 {} 处理失败: {}", channel.name, e);
                        }
                        ChannelResult::Failed {
                            error: e.to_string(),
                            retryable,
                        }
                    }
                };
                ChannelOutcome {
                    channel: channel.name,
                    result,
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await
    };

    outcomes.sort_by(|a, b| a.channel.cmp(&b.channel));

    Ok(WalkReport {
        started_at,
        elapsed_ms: start.elapsed().as_millis() as u64,
        channels: outcomes,
    })
}
