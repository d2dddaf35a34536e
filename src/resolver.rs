//! 路径解析模块
//!
//! 由远程路径、URL类别、输入文档目录和基础路径计算本地存储位置

use std::path::{Component, Path, PathBuf};

use crate::classifier::UrlClass;
use crate::error::Result;
use crate::localize_error;

/// 远程文件对应的本地存储位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    /// 磁盘上的绝对位置: root/<tag>/<remote_path>
    pub absolute_path: PathBuf,
    /// 写入HTML的引用: base_path/<tag>/<remote_path>
    pub relative_reference: String,
}

/// 解析存储位置
///
/// 引用始终以 `/` 拼接，与平台无关。含有 `..`、根目录或盘符的
/// 远程路径会被拒绝，防止写出存储子目录。
pub fn resolve(
    remote_path: &str,
    class: UrlClass,
    input_doc_dir: &Path,
    base_path: &str,
) -> Result<StorageLocation> {
    ensure_contained(remote_path)?;

    let tag = class.storage_dir();
    let absolute_path = input_doc_dir.join(tag).join(remote_path);

    Ok(StorageLocation {
        absolute_path,
        relative_reference: join_reference(base_path, tag, remote_path),
    })
}

fn ensure_contained(remote_path: &str) -> Result<()> {
    if remote_path.is_empty() {
        return Err(localize_error!(input_validation, remote_path, "远程路径为空"));
    }

    let escapes = Path::new(remote_path).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes {
        return Err(localize_error!(path_escape, remote_path));
    }
    Ok(())
}

fn join_reference(base_path: &str, tag: &str, remote_path: &str) -> String {
    if base_path.is_empty() {
        return format!("{}/{}", tag, remote_path);
    }
    format!("{}/{}/{}", base_path.trim_end_matches('/'), tag, remote_path)
}
