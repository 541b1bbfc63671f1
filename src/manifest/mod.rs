pub mod errors;
pub mod models;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use errors::ManifestParseError;
use models::{DESCRIPTOR_NAME, ManifestEntry, ModpackDescriptor};

// 流式解析的两个阶段
#[derive(Debug, Clone, PartialEq)]
enum ExtractState {
    // 还没读到顶层描述文件，遇到的模组文件不保留
    AwaitingFolderList,
    // 已知目录前缀，后续匹配的文件都解析成清单条目
    ExtractingEntries(Vec<String>),
}

/// 清单解析器
///
/// 压缩包只按顺序读一遍，不依赖中央目录。顶层描述文件必须出现在模组文件
/// 之前，排在它前面的模组文件会被跳过并记录警告。
#[derive(Debug)]
pub struct ManifestExtractor {
    state: ExtractState,
    entries: Vec<ManifestEntry>,
    skipped_early: Vec<String>,
}

impl ManifestExtractor {
    pub fn new() -> Self {
        Self {
            state: ExtractState::AwaitingFolderList,
            entries: Vec::new(),
            skipped_early: Vec::new(),
        }
    }

    /// 解析磁盘上的清单压缩包
    pub fn extract(path: impl AsRef<Path>) -> Result<Vec<ManifestEntry>, ManifestParseError> {
        let path = path.as_ref();
        info!("开始解析清单: {}", path.display());
        let file = File::open(path)?;
        Self::extract_from_reader(BufReader::new(file))
    }

    /// 在阻塞线程池里解析，避免卡住异步运行时
    pub async fn extract_async(path: PathBuf) -> Result<Vec<ManifestEntry>, ManifestParseError> {
        tokio::task::spawn_blocking(move || Self::extract(path))
            .await
            .map_err(|e| ManifestParseError::Join(e.to_string()))?
    }

    pub fn extract_from_reader<R: Read>(
        mut reader: R,
    ) -> Result<Vec<ManifestEntry>, ManifestParseError> {
        let mut extractor = Self::new();

        while let Some(mut file) = zip::read::read_zipfile_from_stream(&mut reader)? {
            let name = file.name().to_string();
            let is_file = file.is_file();
            extractor.accept(&name, is_file, &mut file)?;
            // file 在这里被 drop，剩余数据会被读完，流才能继续
        }

        extractor.finish()
    }

    // 处理流中的一个条目
    fn accept(
        &mut self,
        name: &str,
        is_file: bool,
        content: &mut impl Read,
    ) -> Result<(), ManifestParseError> {
        if name == DESCRIPTOR_NAME {
            let descriptor: ModpackDescriptor =
                serde_json::from_slice(&read_all(content)?)
                    .map_err(ManifestParseError::InvalidDescriptor)?;
            debug!("安装目录: {:?}", descriptor.mod_install_folders);
            if matches!(self.state, ExtractState::ExtractingEntries(_)) {
                warn!("清单中出现了多个 {}，以最后一个为准", DESCRIPTOR_NAME);
            }
            self.state = ExtractState::ExtractingEntries(descriptor.mod_install_folders);
            return Ok(());
        }

        if !is_file {
            return Ok(());
        }

        match &self.state {
            ExtractState::AwaitingFolderList => {
                self.skipped_early.push(name.to_string());
            }
            ExtractState::ExtractingEntries(folders) => {
                if folders.iter().any(|folder| name.starts_with(folder.as_str())) {
                    debug!("解析模组文件: {}", name);
                    let entry: ManifestEntry = serde_json::from_slice(&read_all(content)?)
                        .map_err(|source| ManifestParseError::InvalidEntry {
                            path: name.to_string(),
                            source,
                        })?;
                    self.entries.push(entry);
                }
            }
        }

        Ok(())
    }

    fn finish(self) -> Result<Vec<ManifestEntry>, ManifestParseError> {
        if self.state == ExtractState::AwaitingFolderList {
            return Err(ManifestParseError::MissingDescriptor(
                DESCRIPTOR_NAME.to_string(),
            ));
        }

        if !self.skipped_early.is_empty() {
            warn!(
                "有 {} 个文件排在 {} 之前，已被忽略: {:?}",
                self.skipped_early.len(),
                DESCRIPTOR_NAME,
                self.skipped_early
            );
        }

        info!("清单解析完成，共 {} 个条目", self.entries.len());
        Ok(self.entries)
    }
}

impl Default for ManifestExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn read_all(content: &mut impl Read) -> Result<Vec<u8>, std::io::Error> {
    let mut buf = Vec::new();
    content.read_to_end(&mut buf)?;
    Ok(buf)
}
