mod errors;
mod session;

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::client::client::NexusClient;
pub use errors::{AuthError, Result};
pub use session::{DEFAULT_SESSION_FILE, SessionStore};

const SIGN_IN_URL: &str = "https://users.nexusmods.com/auth/sign_in";
const SESSION_COOKIE: &str = "nexusmods_session";
const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

lazy_static! {
    static ref AUTH_TOKEN: Regex =
        Regex::new(r#"name\s*=\s*["']authenticity_token["'][^>]*value\s*=\s*["']([^"']+)["']"#)
            .unwrap();
}

#[derive(Serialize)]
struct SignInForm<'a> {
    authenticity_token: &'a str,
    #[serde(rename = "user[login]")]
    login: &'a str,
    #[serde(rename = "user[password]")]
    password: &'a str,
    commit: &'a str,
}

// 认证管理：只负责产出一个已登录的客户端
#[derive(Debug)]
pub struct AuthManager {
    session_store: SessionStore,
}

impl AuthManager {
    pub fn new(session_store: SessionStore) -> Self {
        Self { session_store }
    }

    /// 使用 Cookie 登录，参数可以是 Cookie 数组 JSON，也可以是文件路径
    pub fn login_by_cookies(&self, cookie: &str) -> Result<NexusClient> {
        let path = Path::new(cookie);
        let client = if path.is_file() {
            NexusClient::load_cookies_from_local(path)?
        } else {
            NexusClient::from_cookie_json(cookie)?
        };
        info!("{}", "已加载提供的 Cookie".green());
        Ok(client)
    }

    /// 尝试复用上次保存的会话
    pub fn restore_session(&self) -> Option<NexusClient> {
        let client = self.session_store.load()?;
        info!("{}: {}", "复用已保存的会话".green(), self.session_store.path().display());
        Some(client)
    }

    /// 账号密码登录，成功后打印并保存 Cookie
    pub async fn login_with_credentials(&self, user: &str, pass: &str) -> Result<NexusClient> {
        info!("开始账号密码登录: {}", user);
        let client = tokio::time::timeout(LOGIN_TIMEOUT, Self::sign_in(user, pass))
            .await
            .map_err(|_| AuthError::Timeout)??;

        info!("{}", "登录成功！".green());
        info!("如果需要多次运行，请复制下面的 Cookie 并通过 --cookie 或 COOKIE 环境变量传入");
        let cookies = serde_json::to_string(&client.get_all_cookies())
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;
        println!("{}", cookies);

        if let Err(e) = self.session_store.save(&client) {
            warn!("保存会话失败: {}", e);
        }
        Ok(client)
    }

    async fn sign_in(user: &str, pass: &str) -> Result<NexusClient> {
        let client = NexusClient::new()?;

        let page = client.get_text(SIGN_IN_URL).await?;
        let token = AUTH_TOKEN
            .captures(&page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AuthError::LoginFailed("登录页面中没有找到 authenticity_token".to_string()))?;
        debug!("获取到登录令牌");

        let form = SignInForm {
            authenticity_token: &token,
            login: user,
            password: pass,
            commit: "Log in",
        };
        client.post_form(SIGN_IN_URL, &form).await?;

        if !client.has_cookie(SESSION_COOKIE) {
            return Err(AuthError::LoginFailed(
                "没有拿到会话 Cookie，请检查账号密码".to_string(),
            ));
        }
        Ok(client)
    }
}
