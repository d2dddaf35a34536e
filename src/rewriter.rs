//! 文档改写模块
//!
//! 逐行流式读取HTML文档，下载匹配到的远程附件，
//! 并把URL字面量替换为本地引用后写入输出文档

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info};

use crate::classifier::{RemoteFileReference, UrlClass, UrlClassifier};
use crate::config::MatchMode;
use crate::error::Result;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::localize_error;
use crate::resolver::resolve;
use crate::source::RemoteSource;
use crate::store::AssetStore;

/// 单个文档的处理统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    /// 读取的行数
    pub lines: usize,
    /// 发生替换的行数
    pub lines_rewritten: usize,
    /// 替换的引用数
    pub references_rewritten: usize,
    /// 新下载的文件数
    pub downloaded: usize,
    /// 已存在而跳过的文件数
    pub already_present: usize,
    /// 下载的字节数
    pub bytes_downloaded: usize,
}

impl DocumentReport {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::AlreadyPresent => self.already_present += 1,
            FetchOutcome::Downloaded(bytes) => {
                self.downloaded += 1;
                self.bytes_downloaded += bytes;
            }
        }
    }
}

/// 文档改写器
pub struct DocumentRewriter<'a, S, R> {
    classifier: UrlClassifier,
    fetcher: &'a Fetcher<S, R>,
    match_mode: MatchMode,
}

impl<'a, S: AssetStore, R: RemoteSource> DocumentRewriter<'a, S, R> {
    pub fn new(fetcher: &'a Fetcher<S, R>, match_mode: MatchMode) -> Result<Self> {
        Ok(Self {
            classifier: UrlClassifier::new()?,
            fetcher,
            match_mode,
        })
    }

    /// 改写单个文档
    ///
    /// 附件存放在输入文档所在目录下；除被替换的URL外，
    /// 输出与输入逐字节一致（包括行尾符）。
    pub async fn rewrite(
        &self,
        input: &Path,
        output: &Path,
        base_path: &str,
    ) -> Result<DocumentReport> {
        info!("📂 处理文档 {}", input.display());

        let input_file = File::open(input)
            .await
            .map_err(|e| localize_error!(file_op, input.display(), "读取", e))?;
        let input_dir = match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let output_file = File::create(output)
            .await
            .map_err(|e| localize_error!(file_op, output.display(), "创建", e))?;

        let mut reader = BufReader::new(input_file);
        let mut writer = BufWriter::new(output_file);
        let mut report = DocumentReport::default();
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| localize_error!(file_op, input.display(), "读取", e))?;
            if read == 0 {
                break;
            }
            report.lines += 1;

            if UrlClassifier::has_remote_url(&line) {
                let replaced = self
                    .rewrite_line(&mut line, input_dir, base_path, &mut report)
                    .await?;
                if replaced > 0 {
                    report.lines_rewritten += 1;
                    report.references_rewritten += replaced;
                }
            }

            writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| localize_error!(file_op, output.display(), "写入", e))?;
        }

        writer
            .flush()
            .await
            .map_err(|e| localize_error!(file_op, output.display(), "写入", e))?;

        debug!(
            "文档完成 {}: {} 行, {} 行被改写",
            output.display(),
            report.lines,
            report.lines_rewritten
        );
        Ok(report)
    }

    /// 按固定类别顺序处理一行，返回替换的引用数
    async fn rewrite_line(
        &self,
        line: &mut String,
        input_dir: &Path,
        base_path: &str,
        report: &mut DocumentReport,
    ) -> Result<usize> {
        let mut replaced = 0;

        for class in UrlClass::ALL {
            for reference in self.matches(line, class) {
                let location = resolve(&reference.remote_path, class, input_dir, base_path)?;
                let outcome = self
                    .fetcher
                    .ensure_local(&location.absolute_path, &reference.full_url)
                    .await?;
                report.record(outcome);

                // 字面量替换：同一URL在该行的所有出现都会被替换
                *line = line.replace(&reference.full_url, &location.relative_reference);
                replaced += 1;
            }
        }

        Ok(replaced)
    }

    fn matches(&self, line: &str, class: UrlClass) -> Vec<RemoteFileReference> {
        match self.match_mode {
            MatchMode::FirstPerClass => self
                .classifier
                .classify_first(line, class)
                .into_iter()
                .collect(),
            MatchMode::AllMatches => {
                let mut seen = HashSet::new();
                let mut all: Vec<_> = self
                    .classifier
                    .classify_all(line, class)
                    .into_iter()
                    .filter(|reference| seen.insert(reference.full_url.clone()))
                    .collect();
                // 先替换较长的URL，避免前缀相同的URL被截断
                all.sort_by(|a, b| b.full_url.len().cmp(&a.full_url.len()));
                all
            }
        }
    }
}
