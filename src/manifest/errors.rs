use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestParseError {
    #[error("无法读取清单文件: {0}")]
    Io(#[from] std::io::Error),

    #[error("清单压缩包损坏: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("清单中缺少顶层描述文件 {0}")]
    MissingDescriptor(String),

    #[error("顶层描述文件格式错误: {0}")]
    InvalidDescriptor(serde_json::Error),

    #[error("模组描述文件 {path} 格式错误: {source}")]
    InvalidEntry {
        path: String,
        source: serde_json::Error,
    },

    #[error("后台解析任务异常: {0}")]
    Join(String),
}
