//! Chat Archive Localizer - 聊天导出附件本地化工具库
//!
//! 扫描频道HTML导出中的远程附件URL，下载到本地缓存目录，
//! 并把文档中的引用改写为本地相对路径。

pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod rewriter;
pub mod source;
pub mod stats;
pub mod store;
pub mod utils;
pub mod walker;
