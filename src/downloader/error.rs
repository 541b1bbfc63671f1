use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::errors::ResolveError;

#[derive(Debug, Error)]
pub enum DownloadError {
    // 下载目录无法创建或访问，整个批次终止
    #[error("无法访问下载目录 {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("获取下载链接失败: {0}")]
    Resolution(#[from] ResolveError),

    #[error("文件名会写到下载目录之外: {0}")]
    InvalidFileName(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("校验失败，期望 {expected}，实际 {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// 只有下载目录错误会中止整个批次，其他错误只记作一次失败
    pub fn is_fatal(&self) -> bool {
        matches!(self, DownloadError::Filesystem { .. })
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        DownloadError::Network(error.to_string())
    }
}
