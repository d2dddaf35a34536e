//! URL分类模块
//!
//! 识别一行文本中的远程附件URL（私有文件、缩略图、头像），
//! 并提取完整URL和用作本地子路径的远程路径

// 第三方crate导入
use regex::Regex;

// 本地模块导入
use crate::constants::storage_dirs;
use crate::error::Result;

/// 私有文件: https://files.<host>/files-pri/<path>?t=<token>
const PRIVATE_PATTERN: &str =
    r#"(?P<url>https?://files\.[-\w.]+/files-pri/(?P<file>[^\s'"?<>]+)\?t=[^\s'"<>]+)"#;

/// 缩略图: 与私有文件相同，路径段为 files-tmb
const THUMBNAIL_PATTERN: &str =
    r#"(?P<url>https?://files\.[-\w.]+/files-tmb/(?P<file>[^\s'"?<>]+)\?t=[^\s'"<>]+)"#;

/// 头像: https://avatars.<edge-host>/<path>，查询串可选且不计入路径
const AVATAR_PATTERN: &str =
    r#"(?P<url>https?://avatars\.[-\w.]+/(?P<file>[^\s'"?#<>]+)(?:\?[^\s'"<>]*)?)"#;

/// 远程URL类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClass {
    Private,
    Thumbnail,
    Avatar,
}

impl UrlClass {
    /// 按固定处理顺序排列的全部类别
    pub const ALL: [UrlClass; 3] = [UrlClass::Private, UrlClass::Thumbnail, UrlClass::Avatar];

    /// 该类别对应的本地存储子目录
    pub fn storage_dir(self) -> &'static str {
        match self {
            UrlClass::Private => storage_dirs::PRIVATE_DIR,
            UrlClass::Thumbnail => storage_dirs::THUMBNAIL_DIR,
            UrlClass::Avatar => storage_dirs::AVATAR_DIR,
        }
    }
}

/// 单次匹配得到的远程文件引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileReference {
    pub url_class: UrlClass,
    /// 完整URL（包含令牌查询参数）
    pub full_url: String,
    /// 标识文件的路径部分，原样用作本地子路径
    pub remote_path: String,
}

/// URL分类器
///
/// 正则在构造时编译一次，之后可在任意多行上复用。
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    private: Regex,
    thumbnail: Regex,
    avatar: Regex,
}

impl UrlClassifier {
    /// 编译全部URL模式
    pub fn new() -> Result<Self> {
        Ok(Self {
            private: compile(PRIVATE_PATTERN)?,
            thumbnail: compile(THUMBNAIL_PATTERN)?,
            avatar: compile(AVATAR_PATTERN)?,
        })
    }

    /// 快速判断一行是否包含任何 http(s):// 子串
    pub fn has_remote_url(line: &str) -> bool {
        line.contains("http://") || line.contains("https://")
    }

    fn regex_for(&self, class: UrlClass) -> &Regex {
        match class {
            UrlClass::Private => &self.private,
            UrlClass::Thumbnail => &self.thumbnail,
            UrlClass::Avatar => &self.avatar,
        }
    }

    /// 返回指定类别在该行中的第一个匹配
    pub fn classify_first(&self, line: &str, class: UrlClass) -> Option<RemoteFileReference> {
        self.regex_for(class)
            .captures(line)
            .and_then(|caps| to_reference(&caps, class))
    }

    /// 返回指定类别在该行中的全部不重叠匹配
    pub fn classify_all(&self, line: &str, class: UrlClass) -> Vec<RemoteFileReference> {
        self.regex_for(class)
            .captures_iter(line)
            .filter_map(|caps| to_reference(&caps, class))
            .collect()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| anyhow::anyhow!("编译URL正则失败: {}", e).into())
}

fn to_reference(caps: &regex::Captures<'_>, class: UrlClass) -> Option<RemoteFileReference> {
    let url = caps.name("url")?;
    let file = caps.name("file")?;
    Some(RemoteFileReference {
        url_class: class,
        full_url: url.as_str().to_string(),
        remote_path: file.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> UrlClassifier {
        UrlClassifier::new().unwrap()
    }

    #[test]
    fn test_fast_path() {
        assert!(!UrlClassifier::has_remote_url("<p>hello world</p>\n"));
        assert!(!UrlClassifier::has_remote_url("<a href=\"ftp://host/file\">"));
        assert!(UrlClassifier::has_remote_url("<a href=\"http://example.com\">"));
        assert!(UrlClassifier::has_remote_url("see https://example.com"));
    }

    #[test]
    fn test_private_match() {
        let line = r#"<img src="https://files.slack.com/files-pri/T1/F1/avatar.png?t=abc123">"#;
        let found = classifier().classify_first(line, UrlClass::Private).unwrap();

        assert_eq!(found.url_class, UrlClass::Private);
        assert_eq!(
            found.full_url,
            "https://files.slack.com/files-pri/T1/F1/avatar.png?t=abc123"
        );
        assert_eq!(found.remote_path, "T1/F1/avatar.png");
    }

    #[test]
    fn test_private_requires_token() {
        let line = r#"<img src="https://files.slack.com/files-pri/T1/F1/avatar.png">"#;
        assert!(classifier().classify_first(line, UrlClass::Private).is_none());
    }

    #[test]
    fn test_thumbnail_match() {
        let line = r#"<img src='http://files.example.org/files-tmb/T9-F8-3a/pic_360.jpg?t=xoxe-1'>"#;
        let found = classifier().classify_first(line, UrlClass::Thumbnail).unwrap();

        assert_eq!(found.remote_path, "T9-F8-3a/pic_360.jpg");
        assert_eq!(
            found.full_url,
            "http://files.example.org/files-tmb/T9-F8-3a/pic_360.jpg?t=xoxe-1"
        );
        assert!(classifier().classify_first(line, UrlClass::Private).is_none());
    }

    #[test]
    fn test_avatar_match_without_token() {
        let line = r#"<img class="avatar" src="https://avatars.slack-edge.com/2020-01-01/123_abc_72.jpg">"#;
        let found = classifier().classify_first(line, UrlClass::Avatar).unwrap();

        assert_eq!(found.remote_path, "2020-01-01/123_abc_72.jpg");
        assert_eq!(
            found.full_url,
            "https://avatars.slack-edge.com/2020-01-01/123_abc_72.jpg"
        );
    }

    #[test]
    fn test_avatar_query_kept_in_url_only() {
        let line = r#"<img src="https://avatars.slack-edge.com/a/b.png?s=48">"#;
        let found = classifier().classify_first(line, UrlClass::Avatar).unwrap();

        assert_eq!(found.full_url, "https://avatars.slack-edge.com/a/b.png?s=48");
        assert_eq!(found.remote_path, "a/b.png");
    }

    #[test]
    fn test_first_versus_all() {
        let line = concat!(
            r#"<a href="https://files.slack.com/files-pri/T1/F1/a.pdf?t=1">"#,
            r#"<a href="https://files.slack.com/files-pri/T1/F2/b.pdf?t=2">"#,
        );
        let c = classifier();

        let first = c.classify_first(line, UrlClass::Private).unwrap();
        assert_eq!(first.remote_path, "T1/F1/a.pdf");

        let all = c.classify_all(line, UrlClass::Private);
        let paths: Vec<_> = all.iter().map(|r| r.remote_path.as_str()).collect();
        assert_eq!(paths, vec!["T1/F1/a.pdf", "T1/F2/b.pdf"]);
    }

    #[test]
    fn test_unrelated_urls_ignored() {
        let line = r#"<a href="https://example.com/files-pri/x?t=1">link</a>"#;
        let c = classifier();
        for class in UrlClass::ALL {
            assert!(c.classify_first(line, class).is_none());
        }
    }

    #[test]
    fn test_storage_dirs() {
        assert_eq!(UrlClass::Private.storage_dir(), "pri_files");
        assert_eq!(UrlClass::Thumbnail.storage_dir(), "tmb_files");
        assert_eq!(UrlClass::Avatar.storage_dir(), "avatar_files");
    }
}
