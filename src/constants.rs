/// 本地化工具常量配置
///
/// 该文件集中定义目录命名、导出布局和运行参数的默认值

/// 本地存储子目录（每种URL类别一个）
pub mod storage_dirs {
    /// 私有文件存储目录
    pub const PRIVATE_DIR: &str = "pri_files";

    /// 缩略图存储目录
    pub const THUMBNAIL_DIR: &str = "tmb_files";

    /// 头像存储目录
    pub const AVATAR_DIR: &str = "avatar_files";
}

/// 频道导出目录布局
pub mod export_layout {
    /// 每个频道子目录中的输入文档名
    pub const INPUT_FILE_NAME: &str = "index.html";

    /// 默认输出文档名
    pub const DEFAULT_OUTPUT_FILE_NAME: &str = "index_local.html";

    /// 默认引用基础路径（频道根目录的上一级）
    pub const DEFAULT_BASE_PATH: &str = "..";

    /// 默认频道根目录
    pub const DEFAULT_CHANNEL_DIR: &str = "./";
}

/// 运行参数
pub mod runtime {
    /// 默认并发处理的频道数量
    pub const DEFAULT_CONCURRENT_CHANNELS: usize = 4;
}
