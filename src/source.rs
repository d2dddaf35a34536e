//! 远程资源获取模块
//!
//! 纯HTTP(S) GET，不附加自定义请求头，认证信息完全由URL中的令牌携带

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::localize_error;

/// 远程资源来源
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// 获取URL的完整响应体
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// 基于reqwest的HTTP来源
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    check_status: bool,
}

impl HttpSource {
    /// 创建HTTP来源
    ///
    /// `timeout` 为 None 时沿用传输层默认值；`check_status` 为 false 时
    /// 非2xx响应体也会被当作文件内容返回。
    pub fn new(timeout: Option<Duration>, check_status: bool) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("创建HTTP客户端失败")?;

        Ok(Self {
            client,
            check_status,
        })
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let parsed = Url::parse(url)
            .map_err(|e| localize_error!(input_validation, url, e))?;

        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        debug!("响应状态 [{}]: {}", status.as_u16(), url);

        let response = if self.check_status {
            response.error_for_status()?
        } else {
            response
        };

        Ok(response.bytes().await?)
    }
}
