//! 文件缓存与下载模块
//!
//! 确保远程文件在本地恰好存在一份：命中则跳过，未命中才发起网络请求。
//! 同一目标路径在同一时刻至多只有一个下载在进行。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::error::Result;
use crate::source::RemoteSource;
use crate::store::AssetStore;

/// 单次 ensure_local 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 目标已存在，未发起请求
    AlreadyPresent,
    /// 已下载并写入的字节数
    Downloaded(usize),
}

/// 按目标路径串行化下载
///
/// 每个路径一个容量为1的信号量，懒创建，无人等待时移除。
#[derive(Debug, Default)]
struct PathLimiter {
    permits: DashMap<PathBuf, Arc<Semaphore>>,
}

impl PathLimiter {
    async fn acquire(&self, key: &Path) -> Result<OwnedSemaphorePermit> {
        let semaphore = self
            .permits
            .entry(key.to_path_buf())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();

        semaphore
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("路径信号量已关闭 {}: {}", key.display(), e).into())
    }

    fn release(&self, key: &Path) {
        self.permits
            .remove_if(key, |_, semaphore| Arc::strong_count(semaphore) == 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.permits.len()
    }
}

/// 带缓存的下载器
pub struct Fetcher<S, R> {
    store: S,
    source: R,
    limiter: PathLimiter,
}

impl<S: AssetStore, R: RemoteSource> Fetcher<S, R> {
    pub fn new(store: S, source: R) -> Self {
        Self {
            store,
            source,
            limiter: PathLimiter::default(),
        }
    }

    /// 确保 `path` 处存在 `url` 的内容
    ///
    /// 传输错误、状态错误和文件系统错误都会直接返回，不做重试。
    pub async fn ensure_local(&self, path: &Path, url: &str) -> Result<FetchOutcome> {
        info!("🔗 处理 {}", url);

        if self.store.has(path).await? {
            info!("✅ {} 已存在", path.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let permit = self.limiter.acquire(path).await?;
        let outcome = self.fetch_locked(path, url).await;
        drop(permit);
        self.limiter.release(path);

        outcome
    }

    async fn fetch_locked(&self, path: &Path, url: &str) -> Result<FetchOutcome> {
        // 等锁期间可能已被其他频道写入
        if self.store.has(path).await? {
            debug!("等待期间已完成下载: {}", path.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let body = self.source.fetch(url).await?;

        info!("💾 写入文件 {}", path.display());
        self.store.put(path, &body).await?;
        Ok(FetchOutcome::Downloaded(body.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocalizeError;
    use crate::localize_error;
    use crate::store::FsAssetStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteSource for CountingSource {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail {
                return Err(localize_error!(network, url, "connection refused"));
            }
            Ok(Bytes::from(format!("body of {}", url)))
        }
    }

    fn fetcher(calls: &Arc<AtomicUsize>, fail: bool) -> Fetcher<FsAssetStore, CountingSource> {
        Fetcher::new(
            FsAssetStore::new(),
            CountingSource {
                calls: calls.clone(),
                fail,
            },
        )
    }

    #[tokio::test]
    async fn test_download_then_cache_hit() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pri_files/T1/a.png");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = fetcher(&calls, false);

        let first = fetcher.ensure_local(&path, "https://x/a").await.unwrap();
        assert_eq!(first, FetchOutcome::Downloaded("body of https://x/a".len()));

        let second = fetcher.ensure_local(&path, "https://x/a").await.unwrap();
        assert_eq!(second, FetchOutcome::AlreadyPresent);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.limiter.len(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.png");
        std::fs::write(&path, b"\x00arbitrary").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = fetcher(&calls, false)
            .ensure_local(&path, "https://x/a")
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read(&path).unwrap(), b"\x00arbitrary");
    }

    #[tokio::test]
    async fn test_existing_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("tmb_files/T1");
        std::fs::create_dir_all(&parent).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome = fetcher(&calls, false)
            .ensure_local(&parent.join("b.jpg"), "https://x/b")
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Downloaded(_)));
        assert!(parent.join("b.jpg").exists());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pri_files/a.png");
        let calls = Arc::new(AtomicUsize::new(0));

        let result = fetcher(&calls, true).ensure_local(&path, "https://x/a").await;

        assert!(matches!(result, Err(LocalizeError::Network { .. })));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pri_files/shared.png");
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = fetcher(&calls, false);

        let (a, b, c) = tokio::join!(
            fetcher.ensure_local(&path, "https://x/shared"),
            fetcher.ensure_local(&path, "https://x/shared"),
            fetcher.ensure_local(&path, "https://x/shared"),
        );

        let downloaded = [a.unwrap(), b.unwrap(), c.unwrap()]
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Downloaded(_)))
            .count();
        assert_eq!(downloaded, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.limiter.len(), 0);
    }
}
