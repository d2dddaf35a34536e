//! 配置管理模块
//!
//! 提供CLI参数解析和本地化配置管理功能

// 标准库导入
use std::path::PathBuf;
use std::time::Duration;

// 第三方crate导入
use clap::Parser;

// 本地模块导入
use crate::constants::{export_layout, runtime};

/// 每行URL匹配模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// 每种URL类别每行只处理第一个匹配
    #[default]
    FirstPerClass,
    /// 处理每种类别的全部不重叠匹配
    AllMatches,
}

/// 本地化配置结构体
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use chat_archive_localizer::config::{LocalizeConfig, MatchMode};
///
/// let config = LocalizeConfig::new()
///     .with_base_path("/archive/channel")
///     .with_output_file_name("local.html")
///     .with_concurrent_channels(2)
///     .with_match_mode(MatchMode::AllMatches);
/// assert_eq!(config.base_path(), "/archive/channel");
/// ```
#[derive(Debug, Clone)]
pub struct LocalizeConfig {
    /// 嵌入改写后引用中的基础路径
    base_path: String,
    /// 每个频道的输出文档名
    output_file_name: String,
    /// 每个频道的输入文档名
    input_file_name: String,
    /// 并发处理的频道数量
    concurrent_channels: usize,
    /// URL匹配模式
    match_mode: MatchMode,
    /// 是否把非2xx响应视为失败
    check_status: bool,
    /// 遇到第一个失败频道即中止
    fail_fast: bool,
    /// 请求超时（None表示使用传输层默认值）
    request_timeout: Option<Duration>,
}

impl LocalizeConfig {
    /// 创建新的配置实例
    ///
    /// 返回具有默认值的配置实例：
    /// - 基础路径: ".."
    /// - 输出文档: "index_local.html"
    /// - 并发频道: 4
    /// - 校验HTTP状态: true
    pub fn new() -> Self {
        Self {
            base_path: export_layout::DEFAULT_BASE_PATH.to_string(),
            output_file_name: export_layout::DEFAULT_OUTPUT_FILE_NAME.to_string(),
            input_file_name: export_layout::INPUT_FILE_NAME.to_string(),
            concurrent_channels: runtime::DEFAULT_CONCURRENT_CHANNELS,
            match_mode: MatchMode::default(),
            check_status: true,
            fail_fast: false,
            request_timeout: None,
        }
    }

    /// 获取基础路径
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// 获取输出文档名
    pub fn output_file_name(&self) -> &str {
        &self.output_file_name
    }

    /// 获取输入文档名
    pub fn input_file_name(&self) -> &str {
        &self.input_file_name
    }

    /// 获取并发频道数量（至少为1）
    pub fn concurrent_channels(&self) -> usize {
        self.concurrent_channels.max(1)
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// 是否校验HTTP状态码
    pub fn check_status(&self) -> bool {
        self.check_status
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// 设置基础路径
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    /// 设置输出文档名
    pub fn with_output_file_name(mut self, name: &str) -> Self {
        self.output_file_name = name.to_string();
        self
    }

    /// 设置并发频道数量
    pub fn with_concurrent_channels(mut self, count: usize) -> Self {
        self.concurrent_channels = count;
        self
    }

    /// 设置URL匹配模式
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// 设置是否校验HTTP状态码
    pub fn with_check_status(mut self, check: bool) -> Self {
        self.check_status = check;
        self
    }

    /// 设置是否在首个失败时中止
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// 设置请求超时
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for LocalizeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "下载聊天导出HTML中引用的远程附件并改写为本地引用", long_about = None)]
pub struct Cli {
    /// 频道导出根目录（每个子目录一个频道）
    #[arg(short, long, value_name = "DIR", default_value = export_layout::DEFAULT_CHANNEL_DIR)]
    pub channel_dir: PathBuf,

    /// 改写后引用使用的基础路径
    #[arg(short, long, default_value = export_layout::DEFAULT_BASE_PATH)]
    pub base_path: String,

    /// 每个频道的输出文档名
    #[arg(short, long, value_name = "FILE", default_value = export_layout::DEFAULT_OUTPUT_FILE_NAME)]
    pub output_name: String,

    /// 并发处理的频道数量
    #[arg(long, default_value_t = runtime::DEFAULT_CONCURRENT_CHANNELS)]
    pub concurrent_channels: usize,

    /// 替换每行中同类URL的全部匹配
    #[arg(long)]
    pub all_matches: bool,

    /// 不校验HTTP状态码，按原样保存响应内容
    #[arg(long)]
    pub accept_any_status: bool,

    /// 遇到第一个失败频道即中止
    #[arg(long)]
    pub fail_fast: bool,

    /// 请求超时时间（秒），默认不设置
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示处理统计
    #[arg(long)]
    pub stats: bool,

    /// 以JSON格式输出处理报告
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// 将命令行参数转换为本地化配置
    pub fn to_config(&self) -> LocalizeConfig {
        let match_mode = if self.all_matches {
            MatchMode::AllMatches
        } else {
            MatchMode::FirstPerClass
        };

        LocalizeConfig::new()
            .with_base_path(&self.base_path)
            .with_output_file_name(&self.output_name)
            .with_concurrent_channels(self.concurrent_channels)
            .with_match_mode(match_mode)
            .with_check_status(!self.accept_any_status)
            .with_fail_fast(self.fail_fast)
            .with_request_timeout(self.timeout.map(Duration::from_secs))
    }
}
