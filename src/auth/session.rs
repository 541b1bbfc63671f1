use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::{info, warn};

use super::errors::Result;
use crate::common::client::client::NexusClient;

/// 默认的会话文件位置
pub const DEFAULT_SESSION_FILE: &str = "sessions/cookies.json";

/// 把登录后的 Cookie 保存到本地，下次运行可以直接复用
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, client: &NexusClient) -> Result<()> {
        client.save_cookies_to_local(&self.path)?;
        info!("{}: {}", "会话已保存".green(), self.path.display());
        Ok(())
    }

    /// 读取保存的会话，文件不存在或无法解析时返回 None
    pub fn load(&self) -> Option<NexusClient> {
        if !self.path.is_file() {
            return None;
        }
        match NexusClient::load_cookies_from_local(&self.path) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("会话文件无效，忽略: {} ({})", self.path.display(), e);
                None
            }
        }
    }
}
