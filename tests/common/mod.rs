#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use md5::{Digest, Md5};
use zip::write::FileOptions;

use modpack_dl::downloader::progress::ProgressSink;
use modpack_dl::downloader::{ByteSource, ByteStream, DownloadError, DownloadTask};
use modpack_dl::manifest::models::ManifestEntry;
use modpack_dl::resolver::LinkResolver;
use modpack_dl::resolver::errors::ResolveError;

pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn entry(name: &str, file_id: Option<u64>, content: &[u8]) -> ManifestEntry {
    ManifestEntry {
        file_name: name.to_string(),
        external_id: file_id,
        mod_id: file_id.map(|id| id + 1000),
        file_size: content.len() as u64,
        expected_hash: md5_hex(content),
        install_folder: format!("mods/{}", name),
        installation_parameters: None,
    }
}

pub fn link_for(file_id: u64) -> String {
    format!("https://cdn.test/files/{}", file_id)
}

/// 按顺序写入条目，生成内存中的 zip
pub fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FakeResolve {
    Link,
    Fail,
}

/// 按文件 ID 预设每次解析结果的假解析器，记录调用顺序
#[derive(Debug, Default)]
pub struct FakeResolver {
    plans: HashMap<u64, VecDeque<FakeResolve>>,
    pub calls: Vec<u64>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(mut self, file_id: u64, steps: &[FakeResolve]) -> Self {
        self.plans.insert(file_id, steps.iter().cloned().collect());
        self
    }

    pub fn calls_for(&self, file_id: u64) -> usize {
        self.calls.iter().filter(|id| **id == file_id).count()
    }
}

#[async_trait]
impl LinkResolver for FakeResolver {
    async fn resolve(&mut self, file_id: u64, _game_id: u64) -> Result<String, ResolveError> {
        self.calls.push(file_id);
        let step = self
            .plans
            .get_mut(&file_id)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(FakeResolve::Link);
        match step {
            FakeResolve::Link => Ok(link_for(file_id)),
            FakeResolve::Fail => Err(ResolveError::LinkNotFound(file_id)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FakeBody {
    Bytes(Vec<u8>),
    // 先发出一部分数据再断开
    BrokenAfter(Vec<u8>),
    Stall,
}

/// 按链接预设每次下载内容的假数据源
#[derive(Debug, Default)]
pub struct FakeSource {
    bodies: Mutex<HashMap<String, VecDeque<FakeBody>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, file_id: u64, bodies: &[FakeBody]) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(link_for(file_id), bodies.iter().cloned().collect());
        self
    }
}

#[async_trait]
impl ByteSource for FakeSource {
    async fn open(&self, url: &str) -> Result<ByteStream, DownloadError> {
        let body = self
            .bodies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|bodies| bodies.pop_front())
            .ok_or_else(|| DownloadError::Network(format!("404: {}", url)))?;

        let stream = match body {
            FakeBody::Bytes(data) => {
                let chunks: Vec<Result<Vec<u8>, DownloadError>> =
                    data.chunks(3).map(|c| Ok(c.to_vec())).collect();
                futures::stream::iter(chunks).boxed()
            }
            FakeBody::BrokenAfter(data) => {
                let chunks: Vec<Result<Vec<u8>, DownloadError>> = vec![
                    Ok(data),
                    Err(DownloadError::Network("connection reset".to_string())),
                ];
                futures::stream::iter(chunks).boxed()
            }
            FakeBody::Stall => futures::stream::pending().boxed(),
        };
        Ok(stream)
    }
}

/// 记录进度事件的 sink
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub started: Vec<String>,
    pub completed: Vec<String>,
    pub ended: Vec<String>,
    pub bytes: HashMap<String, u64>,
}

impl ProgressSink for RecordingSink {
    fn on_task_start(&mut self, task: &DownloadTask) {
        self.started.push(task.task_id().to_string());
    }

    fn on_bytes(&mut self, task_id: &str, delta: u64) {
        *self.bytes.entry(task_id.to_string()).or_default() += delta;
    }

    fn on_task_complete(&mut self, task_id: &str) {
        self.completed.push(task_id.to_string());
    }

    fn on_task_end(&mut self, task_id: &str) {
        self.ended.push(task_id.to_string());
    }
}
