//! 统一错误处理模块
//!
//! 提供附件本地化流程的统一错误类型定义和处理机制

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 附件本地化统一错误类型
///
/// 除了目录已存在的竞争情况外，所有错误都会向上传播
#[derive(Debug)]
pub enum LocalizeError {
    /// 网络传输错误（DNS、连接拒绝、超时等）
    Network {
        /// 请求地址
        url: String,
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// 服务器返回了非成功状态码
    HttpStatus {
        /// 请求地址
        url: String,
        /// 响应状态码
        status_code: u16,
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入、创建等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 输入验证错误
    InputValidation {
        /// 输入值
        input: String,
        /// 验证失败原因
        reason: String,
    },

    /// 远程路径试图逃出存储子目录
    PathEscape {
        /// 捕获到的远程路径
        remote_path: String,
    },

    /// 部分频道处理失败
    ChannelsFailed {
        /// 失败的频道数
        failed: usize,
        /// 频道总数
        total: usize,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl LocalizeError {
    /// 是否属于可重试的失败
    ///
    /// 传输错误、5xx和429视为可重试；工具本身不做重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LocalizeError::Network { .. } => true,
            LocalizeError::HttpStatus { status_code, .. } => {
                *status_code >= 500 || *status_code == 429
            }
            _ => false,
        }
    }
}

impl fmt::Display for LocalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizeError::Network { url, message, status_code } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}] {}: {}", code, url, message)
                } else {
                    write!(f, "网络请求失败 {}: {}", url, message)
                }
            }
            LocalizeError::HttpStatus { url, status_code } => {
                write!(f, "服务器返回错误状态 [{}]: {}", status_code, url)
            }
            LocalizeError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            LocalizeError::InputValidation { input, reason } => {
                write!(f, "输入验证失败 [{}]: {}", input, reason)
            }
            LocalizeError::PathEscape { remote_path } => {
                write!(f, "远程路径越出存储目录: {}", remote_path)
            }
            LocalizeError::ChannelsFailed { failed, total } => {
                write!(f, "{}/{} 个频道处理失败", failed, total)
            }
            LocalizeError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for LocalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocalizeError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 本地化结果类型别名
pub type Result<T> = std::result::Result<T, LocalizeError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! localize_error {
    (network, $url:expr, $msg:expr) => {
        $crate::error::LocalizeError::Network {
            url: $url.to_string(),
            message: $msg.to_string(),
            status_code: None,
        }
    };
    (http_status, $url:expr, $code:expr) => {
        $crate::error::LocalizeError::HttpStatus {
            url: $url.to_string(),
            status_code: $code,
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::LocalizeError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (input_validation, $input:expr, $reason:expr) => {
        $crate::error::LocalizeError::InputValidation {
            input: $input.to_string(),
            reason: $reason.to_string(),
        }
    };
    (path_escape, $remote:expr) => {
        $crate::error::LocalizeError::PathEscape {
            remote_path: $remote.to_string(),
        }
    };
}

/// 从anyhow::Error转换为LocalizeError
impl From<AnyhowError> for LocalizeError {
    fn from(error: AnyhowError) -> Self {
        LocalizeError::Internal { source: error }
    }
}

/// 从reqwest::Error转换为LocalizeError
///
/// 带状态码的错误（来自 error_for_status）归为 HttpStatus
impl From<reqwest::Error> for LocalizeError {
    fn from(error: reqwest::Error) -> Self {
        let url = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        match error.status() {
            Some(status) => LocalizeError::HttpStatus {
                url,
                status_code: status.as_u16(),
            },
            None => LocalizeError::Network {
                url,
                message: error.to_string(),
                status_code: None,
            },
        }
    }
}
