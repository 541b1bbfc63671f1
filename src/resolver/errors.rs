use thiserror::Error;

use crate::common::client::error::ApiError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("请求下载页面失败: {0}")]
    Api(#[from] ApiError),

    #[error("条目没有文件 ID: {0}")]
    MissingFileId(String),

    #[error("下载页面中没有找到下载链接 (file_id={0})")]
    LinkNotFound(u64),

    #[error("下载链接无效: {0}")]
    InvalidLink(String),
}
