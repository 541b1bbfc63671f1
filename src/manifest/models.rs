use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// 整合包顶层描述文件的文件名
pub const DESCRIPTOR_NAME: &str = "modpack.json";

/// 顶层描述文件，只关心需要安装的目录前缀
#[derive(Debug, Clone, Deserialize)]
pub struct ModpackDescriptor {
    pub mod_install_folders: Vec<String>,
}

/// 清单中的一个文件条目，解析后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    // 只能是下载目录下的相对路径
    #[serde(deserialize_with = "de_file_name")]
    pub file_name: String,

    // 没有外部 ID 的条目不参与下载
    #[serde(
        default,
        alias = "nexus_file_id",
        deserialize_with = "de_opt_u64"
    )]
    pub external_id: Option<u64>,

    #[serde(default, alias = "nexus_mod_id", deserialize_with = "de_opt_u64")]
    pub mod_id: Option<u64>,

    #[serde(deserialize_with = "de_u64")]
    pub file_size: u64,

    #[serde(alias = "md5")]
    pub expected_hash: String,

    #[serde(default)]
    pub install_folder: String,

    // 安装参数对下载没有意义，输出失败列表时去掉
    #[serde(default, skip_serializing)]
    pub installation_parameters: Option<serde_json::Value>,
}

impl ManifestEntry {
    /// 比较本地文件的哈希（忽略大小写）
    pub fn hash_matches(&self, actual: &str) -> bool {
        self.expected_hash.eq_ignore_ascii_case(actual)
    }

    /// 文件在下载目录中的位置，文件名会跳出下载目录时返回 None
    pub fn local_path(&self, download_dir: &Path) -> Option<PathBuf> {
        is_plain_file_name(&self.file_name).then(|| download_dir.join(&self.file_name))
    }
}

/// 文件名非空，且只由普通路径组件构成（没有 `..`、根目录或盘符）
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

fn de_file_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    if !is_plain_file_name(&name) {
        return Err(serde::de::Error::custom(format!(
            "文件名不能跳出下载目录: {}",
            name
        )));
    }
    Ok(name)
}

// 清单里的数字有时是字符串形式，这里两种都接受
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("无效的数字: {}", s))),
        }
    }
}

fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_u64()
}

fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value.into_u64().map(Some),
        None => Ok(None),
    }
}
