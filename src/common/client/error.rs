use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("HTTP 状态异常: {0}, URL: {1}")]
    Status(u16, String),

    #[error("Cookie 格式错误: {0}")]
    InvalidCookie(String),

    #[error("创建客户端失败: {0}")]
    ClientBuild(String),

    #[error("IO操作失败: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidCookie(e.to_string())
    }
}
