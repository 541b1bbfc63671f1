use thiserror::Error;

use crate::common::client::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("网络请求失败: {0}")]
    Api(#[from] ApiError),

    #[error("IO操作失败: {0}")]
    IoError(#[from] std::io::Error),

    #[error("登录超时")]
    Timeout,

    #[error("登录失败: {0}")]
    LoginFailed(String),

    #[error("没有提供 Cookie，也没有提供账号密码")]
    MissingCredentials,
}

pub type Result<T> = std::result::Result<T, AuthError>;
