use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use super::checksum::md5_file;
use super::error::DownloadError;
use super::models::{DownloadTask, TaskStatus};
use super::progress::ProgressSink;
use super::queue::WorkQueue;
use super::transport::ByteSource;
use crate::resolver::errors::ResolveError;
use crate::resolver::{DEFAULT_GAME_ID, LinkResolver};

/// 默认的数据块超时时间
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub game_id: u64,
    // 两个数据块之间允许的最长间隔
    pub stream_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            game_id: DEFAULT_GAME_ID,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }
}

/// 下载调度
///
/// 按顺序逐个处理队列中的任务：获取链接、下载、校验。失败的任务追加到队尾
/// 重试一次，第二次仍失败就记入失败列表，不影响其他任务。
pub struct DownloadOrchestrator<S> {
    download_dir: PathBuf,
    source: S,
    options: OrchestratorOptions,
}

impl<S: ByteSource> DownloadOrchestrator<S> {
    pub fn new(download_dir: impl AsRef<Path>, source: S, options: OrchestratorOptions) -> Self {
        Self {
            download_dir: download_dir.as_ref().to_path_buf(),
            source,
            options,
        }
    }

    /// 处理整个队列，返回最终失败的任务
    pub async fn run<R, P>(
        &self,
        mut queue: WorkQueue,
        resolver: &mut R,
        sink: &mut P,
    ) -> Result<Vec<DownloadTask>, DownloadError>
    where
        R: LinkResolver + ?Sized,
        P: ProgressSink + ?Sized,
    {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|source| DownloadError::Filesystem {
                path: self.download_dir.clone(),
                source,
            })?;

        info!("开始下载，共 {} 个文件", queue.len());
        let mut failed = Vec::new();

        // 重试的任务会在循环中追加到队尾
        while let Some(mut task) = queue.pop_front() {
            sink.on_task_start(&task);
            let result = self.attempt(&mut task, resolver, sink).await;

            match result {
                Ok(()) => {
                    task.status = TaskStatus::Complete;
                    sink.on_task_complete(task.task_id());
                    sink.on_task_end(task.task_id());
                    info!("✅ 下载完成: {}", task.task_id());
                }
                Err(e) if e.is_fatal() => {
                    sink.on_task_end(task.task_id());
                    return Err(e);
                }
                Err(e) => {
                    sink.on_task_end(task.task_id());
                    if task.record_failure(e.to_string()) {
                        warn!("下载出错，稍后重试: {}, 错误: {}", task.task_id(), e);
                        if let Err(task) = queue.requeue(task) {
                            failed.push(task);
                        }
                    } else {
                        error!("❌ 文件两次下载都失败了，可能已损坏: {}, 错误: {}", task.task_id(), e);
                        failed.push(task);
                    }
                }
            }
        }

        info!("下载结束，失败 {} 个", failed.len());
        Ok(failed)
    }

    // 单次尝试：获取链接 -> 下载 -> 校验
    async fn attempt<R, P>(
        &self,
        task: &mut DownloadTask,
        resolver: &mut R,
        sink: &mut P,
    ) -> Result<(), DownloadError>
    where
        R: LinkResolver + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let path = task
            .entry
            .local_path(&self.download_dir)
            .ok_or_else(|| DownloadError::InvalidFileName(task.entry.file_name.clone()))?;
        let file_id = task
            .entry
            .external_id
            .ok_or_else(|| ResolveError::MissingFileId(task.entry.file_name.clone()))?;

        task.status = TaskStatus::Downloading;
        debug!("获取下载链接: {} (file_id={})", task.task_id(), file_id);
        let link = resolver.resolve(file_id, self.options.game_id).await?;

        self.stream_to_file(&link, &path, task.task_id(), sink).await?;

        task.status = TaskStatus::Validating;
        let actual = md5_file(&path).await?;
        if !task.entry.hash_matches(&actual) {
            warn!(
                "校验失败: {} (期望 {}, 实际 {})",
                path.display(),
                task.entry.expected_hash,
                actual
            );
            return Err(DownloadError::HashMismatch {
                expected: task.entry.expected_hash.clone(),
                actual,
            });
        }

        Ok(())
    }

    async fn stream_to_file<P>(
        &self,
        link: &str,
        path: &Path,
        task_id: &str,
        sink: &mut P,
    ) -> Result<u64, DownloadError>
    where
        P: ProgressSink + ?Sized,
    {
        debug!("下载文件: {} -> {}", link, path.display());
        let mut stream = self.source.open(link).await?;
        let mut file = tokio::fs::File::create(path).await?;

        let mut downloaded = 0u64;
        loop {
            let next = tokio::time::timeout(self.options.stream_timeout, stream.next())
                .await
                .map_err(|_| {
                    DownloadError::Network(format!(
                        "{} 秒内没有收到数据",
                        self.options.stream_timeout.as_secs()
                    ))
                })?;

            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            sink.on_bytes(task_id, chunk.len() as u64);
        }

        file.flush().await?;
        debug!("文件写入完成: {} ({} 字节)", path.display(), downloaded);
        Ok(downloaded)
    }
}
