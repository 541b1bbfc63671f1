pub mod errors;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::common::client::client::NexusClient;
use errors::ResolveError;

/// 默认游戏 ID
pub const DEFAULT_GAME_ID: u64 = 110;

const DOWNLOAD_POPUP_URL: &str = "https://www.nexusmods.com/Core/Libs/Common/Widgets/DownloadPopUp";

lazy_static! {
    static ref DL_LINK_INPUT: Regex =
        Regex::new(r#"(?is)<input\b[^>]*\bid\s*=\s*["']dl_link["'][^>]*>"#).unwrap();
    static ref VALUE_ATTR: Regex = Regex::new(r#"(?is)\bvalue\s*=\s*["']([^"']*)["']"#).unwrap();
}

/// 把文件 ID 解析成直接下载链接
///
/// 实现通常持有一个有状态的登录会话，不能并发使用，所以接口要求 `&mut self`。
#[async_trait]
pub trait LinkResolver: Send {
    async fn resolve(&mut self, file_id: u64, game_id: u64) -> Result<String, ResolveError>;
}

/// 通过下载弹窗页面取链接
#[derive(Debug)]
pub struct NexusResolver {
    client: NexusClient,
}

impl NexusResolver {
    pub fn new(client: NexusClient) -> Self {
        Self { client }
    }

    pub fn popup_url(file_id: u64, game_id: u64) -> String {
        format!(
            "{}?id={}&game_id={}&source=FileExpander",
            DOWNLOAD_POPUP_URL, file_id, game_id
        )
    }

    /// 从页面 HTML 中取出 `<input id="dl_link">` 的 value
    pub fn extract_link(html: &str) -> Option<String> {
        let input = DL_LINK_INPUT.find(html)?.as_str();
        let value = VALUE_ATTR.captures(input)?.get(1)?.as_str();
        let link = value.replace("&amp;", "&");
        if link.is_empty() { None } else { Some(link) }
    }
}

#[async_trait]
impl LinkResolver for NexusResolver {
    async fn resolve(&mut self, file_id: u64, game_id: u64) -> Result<String, ResolveError> {
        let page = Self::popup_url(file_id, game_id);
        debug!("打开下载页面: {}", page);

        let html = self.client.get_text(&page).await?;
        let link = Self::extract_link(&html)
            .ok_or(ResolveError::LinkNotFound(file_id))?;

        url::Url::parse(&link).map_err(|_| ResolveError::InvalidLink(link.clone()))?;
        info!("获取到下载链接: file_id={}", file_id);
        debug!("下载链接: {}", link);
        Ok(link)
    }
}
