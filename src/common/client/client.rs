use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use cookie_store::CookieStore;
use flate2::read::GzDecoder;
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT},
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::error::ApiError;

const DEFAULT_DOMAIN: &str = "nexusmods.com";
const HOME_URL: &str = "https://www.nexusmods.com/";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// 页面请求的超时，下载请求不设总超时
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// 序列化后的单个 Cookie，兼容浏览器导出的格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieInfo {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

// 自动携带登录状态的客户端
#[derive(Debug, Clone)]
pub struct NexusClient {
    pub inner: Client,
    pub cookie_store: Arc<CookieStoreMutex>,
}

impl NexusClient {
    // 创建基础客户端，未认证
    pub fn new() -> Result<Self, ApiError> {
        Self::with_cookie_store(CookieStore::default())
    }

    fn with_cookie_store(store: CookieStore) -> Result<Self, ApiError> {
        let cookie_store = Arc::new(CookieStoreMutex::new(store));
        let inner = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .cookie_provider(Arc::clone(&cookie_store))
            .build()
            .map_err(|e| {
                error!("Error creating client: {}", e);
                ApiError::ClientBuild(e.to_string())
            })?;

        Ok(Self {
            inner,
            cookie_store,
        })
    }

    /// 用序列化的 Cookie 数组创建已登录的客户端
    pub fn from_cookie_json(json: &str) -> Result<Self, ApiError> {
        let cookies: Vec<CookieInfo> = serde_json::from_str(json)?;
        if cookies.is_empty() {
            return Err(ApiError::InvalidCookie("Cookie 列表为空".to_string()));
        }
        let client = Self::new()?;
        client.set_cookies(&cookies)?;
        Ok(client)
    }

    /// 从本地文件加载 Cookie 数组
    pub fn load_cookies_from_local(path: &Path) -> Result<Self, ApiError> {
        info!("从 {} 加载 Cookie", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_cookie_json(&text)
    }

    pub fn save_cookies_to_local(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.get_all_cookies())
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        std::fs::write(path, json)?;
        info!("Cookies saved to {}", path.display());
        Ok(())
    }

    pub fn get_all_cookies(&self) -> Vec<CookieInfo> {
        let store = match self.cookie_store.lock() {
            Ok(store) => store,
            Err(poisoned) => poisoned.into_inner(),
        };

        store
            .iter_any()
            .map(|cookie| CookieInfo {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
                domain: cookie.domain().map(|d| d.to_string()),
                path: cookie.path().map(|p| p.to_string()),
            })
            .collect()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.get_all_cookies().iter().any(|c| c.name == name)
    }

    pub fn set_cookies(&self, cookies: &[CookieInfo]) -> Result<(), ApiError> {
        let mut store = match self.cookie_store.lock() {
            Ok(store) => store,
            Err(poisoned) => poisoned.into_inner(),
        };

        for info in cookies {
            let domain = info
                .domain
                .as_deref()
                .map(|d| d.trim_start_matches('.'))
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_DOMAIN);
            let cookie: Cookie = Cookie::build((info.name.as_str(), info.value.as_str()))
                .domain(domain)
                .path(info.path.as_deref().unwrap_or("/"))
                .into();

            let url = Url::parse(&format!("https://{}/", domain))
                .map_err(|e| ApiError::InvalidCookie(format!("{}: {}", domain, e)))?;
            store
                .insert_raw(&cookie, &url)
                .map_err(|e| ApiError::InvalidCookie(format!("{}: {}", info.name, e)))?;
        }

        debug!("已写入 {} 个 Cookie", cookies.len());
        Ok(())
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        headers.insert(REFERER, HeaderValue::from_static(HOME_URL));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    // 文件下载用的请求头，不要求压缩，保证写入的字节就是原文件
    pub fn get_download_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(REFERER, HeaderValue::from_static(HOME_URL));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    /// 请求页面并返回文本内容
    pub async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let resp = self
            .inner
            .get(url)
            .headers(Self::get_default_headers())
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("请求失败: {}", e);
                e
            })?;

        Self::read_text(resp).await
    }

    /// 提交表单，返回响应文本
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<String, ApiError> {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let resp = self
            .inner
            .post(url)
            .headers(Self::get_default_headers())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .timeout(PAGE_TIMEOUT)
            .body(body)
            .send()
            .await?;

        Self::read_text(resp).await
    }

    // 专门用于下载文件的方法
    pub async fn get_download_response(&self, url: &str) -> Result<Response, ApiError> {
        debug!("正在请求文件下载: {}", url);
        let resp = self
            .inner
            .get(url)
            .headers(Self::get_download_headers())
            .send()
            .await?;
        Ok(resp)
    }

    fn try_decompress(raw: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut decoder = GzDecoder::new(raw);
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded)?;
        Ok(decoded)
    }

    async fn read_text(resp: Response) -> Result<String, ApiError> {
        let status = resp.status();
        let url = resp.url().to_string();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16(), url));
        }

        let raw_body = resp.bytes().await?;
        let decompressed = match Self::try_decompress(&raw_body) {
            Ok(data) => data,
            Err(_) => raw_body.to_vec(), // 解压失败则原样使用
        };

        Ok(String::from_utf8_lossy(&decompressed).into_owned())
    }
}
