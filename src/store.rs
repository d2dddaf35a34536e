//! 本地资源存储模块
//!
//! 以绝对路径为键的存储抽象。文件是否存在是唯一的缓存命中依据，
//! 不记录ETag、时间戳或内容哈希。

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;
use crate::localize_error;

/// 资源存储后端
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// 键对应的资源是否已存在
    async fn has(&self, key: &Path) -> Result<bool>;

    /// 写入资源；键已存在时不覆盖
    async fn put(&self, key: &Path, bytes: &[u8]) -> Result<()>;
}

/// 文件系统存储
#[derive(Debug, Clone, Default)]
pub struct FsAssetStore;

impl FsAssetStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn has(&self, key: &Path) -> Result<bool> {
        fs::try_exists(key)
            .await
            .map_err(|e| localize_error!(file_op, key.display(), "检查", e))
    }

    async fn put(&self, key: &Path, bytes: &[u8]) -> Result<()> {
        let parent = match key.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        ensure_dir(parent).await?;

        // 先写同目录下的临时文件，完整写入后再改名到目标路径；
        // 中途取消时临时文件随 NamedTempFile 一起删除
        let temp = NamedTempFile::new_in(parent)
            .map_err(|e| localize_error!(file_op, parent.display(), "创建临时文件", e))?;
        let handle = temp
            .reopen()
            .map_err(|e| localize_error!(file_op, temp.path().display(), "打开", e))?;

        let mut file = fs::File::from_std(handle);
        file.write_all(bytes)
            .await
            .map_err(|e| localize_error!(file_op, key.display(), "写入", e))?;
        file.flush()
            .await
            .map_err(|e| localize_error!(file_op, key.display(), "写入", e))?;
        drop(file);

        match temp.persist_noclobber(key) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                debug!("文件已由其他写入者创建，跳过: {}", key.display());
                Ok(())
            }
            Err(e) => Err(localize_error!(file_op, key.display(), "改名", e.error)),
        }
    }
}

/// 创建目录，只吞掉“已存在”这一种竞争错误
async fn ensure_dir(dir: &Path) -> Result<()> {
    if fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(());
    }

    match fs::create_dir_all(dir).await {
        Ok(()) => {
            debug!("创建目录: {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(localize_error!(file_op, dir.display(), "创建目录", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_put_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let key = tmp.path().join("pri_files/T1/F1/a.png");
        let store = FsAssetStore::new();

        assert!(!store.has(&key).await.unwrap());
        store.put(&key, b"png-bytes").await.unwrap();
        assert!(store.has(&key).await.unwrap());
        assert_eq!(std::fs::read(&key).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_put_into_existing_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("tmb_files");
        std::fs::create_dir_all(&parent).unwrap();

        let store = FsAssetStore::new();
        store.put(&parent.join("x.jpg"), b"1").await.unwrap();
        store.put(&parent.join("y.jpg"), b"2").await.unwrap();

        assert_eq!(std::fs::read(parent.join("y.jpg")).unwrap(), b"2");
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let key = tmp.path().join("a.bin");
        std::fs::write(&key, b"original").unwrap();

        FsAssetStore::new().put(&key, b"replacement").await.unwrap();
        assert_eq!(std::fs::read(&key).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_parent_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("pri_files");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = FsAssetStore::new().put(&blocker.join("a.png"), b"x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_put_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("pri_files");
        let key = parent.join("large.bin");
        let payload = vec![7u8; 64 * 1024 * 1024];
        let store = FsAssetStore::new();

        // 写入中途被丢弃
        let _ = tokio::time::timeout(Duration::from_millis(5), store.put(&key, &payload)).await;

        for _ in 0..3 {
            if let Ok(meta) = std::fs::metadata(&key) {
                assert_eq!(meta.len(), payload.len() as u64, "目标路径上出现了不完整文件");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let leftovers: Vec<_> = std::fs::read_dir(&parent)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "large.bin")
            .collect();
        assert!(leftovers.is_empty(), "残留临时文件: {:?}", leftovers);

        // 取消后重新写入必须得到完整内容
        store.put(&key, &payload).await.unwrap();
        assert_eq!(std::fs::metadata(&key).unwrap().len(), payload.len() as u64);
    }
}
