use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, warn};

use super::error::DownloadError;
use crate::common::client::client::NexusClient;

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, DownloadError>>;

/// 把下载链接变成字节流
#[async_trait]
pub trait ByteSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<ByteStream, DownloadError>;
}

/// 基于已登录客户端的 HTTP 下载
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: NexusClient,
}

impl HttpSource {
    pub fn new(client: NexusClient) -> Self {
        Self { client }
    }

    // 检查响应状态
    fn check_response_status(response: &reqwest::Response, url: &str) -> Result<(), DownloadError> {
        let status = response.status();
        debug!("Response Status: {}", status);

        match status {
            reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::UNAUTHORIZED => {
                warn!("🚫 下载被拒绝 ({})，登录状态可能已失效", status);
                Err(DownloadError::Network(format!(
                    "访问被拒绝 ({})，URL: {}",
                    status, url
                )))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("⚠️ 请求过于频繁 (429)");
                Err(DownloadError::Network(format!(
                    "请求过于频繁 (429 Too Many Requests)，URL: {}",
                    url
                )))
            }
            status if status.is_success() => Ok(()),
            _ => Err(DownloadError::Network(format!(
                "HTTP 请求失败，状态码: {}，URL: {}",
                status, url
            ))),
        }
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn open(&self, url: &str) -> Result<ByteStream, DownloadError> {
        let response = self
            .client
            .get_download_response(url)
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        Self::check_response_status(&response, url)?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(DownloadError::from));
        Ok(stream.boxed())
    }
}
