use std::path::{Path, PathBuf};

use futures::StreamExt;
use tracing::{debug, info, warn};

use super::checksum::md5_file;
use super::models::DownloadTask;
use super::queue::WorkQueue;
use crate::manifest::models::ManifestEntry;

/// 默认同时校验的文件数
pub const DEFAULT_HASH_CONCURRENCY: usize = 16;

// 单个条目的检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalState {
    Satisfied,
    Corrupt,
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub satisfied: usize,
    pub corrupt: usize,
    pub missing: usize,
    // 没有外部 ID 或文件名不合法而被排除的条目
    pub skipped: usize,
}

/// 对比清单和本地文件，生成下载队列
pub async fn reconcile(
    entries: Vec<ManifestEntry>,
    download_dir: &Path,
    max_concurrency: usize,
) -> WorkQueue {
    reconcile_with_summary(entries, download_dir, max_concurrency)
        .await
        .0
}

pub async fn reconcile_with_summary(
    entries: Vec<ManifestEntry>,
    download_dir: &Path,
    max_concurrency: usize,
) -> (WorkQueue, ReconcileSummary) {
    let mut summary = ReconcileSummary::default();

    let entries: Vec<ManifestEntry> = entries
        .into_iter()
        .filter(|entry| {
            if entry.external_id.is_none() {
                debug!("跳过没有外部 ID 的条目: {}", entry.file_name);
                summary.skipped += 1;
                false
            } else if entry.local_path(download_dir).is_none() {
                warn!("文件名不合法，跳过: {}", entry.file_name);
                summary.skipped += 1;
                false
            } else {
                true
            }
        })
        .collect();

    debug!("检查下载目录是否存在: {}", download_dir.display());
    if !dir_exists(download_dir).await {
        info!("下载目录不存在，所有文件都需要下载");
        summary.missing = entries.len();
        let queue = entries.into_iter().map(DownloadTask::new).collect();
        return (queue, summary);
    }

    // buffered 保持输入顺序，结果与清单顺序一致
    let states: Vec<(ManifestEntry, LocalState)> = futures::stream::iter(entries)
        .map(|entry| {
            let path = download_dir.join(&entry.file_name);
            async move {
                let state = check_local_file(&entry, path).await;
                (entry, state)
            }
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    // 损坏的插到队头，缺失的追加到队尾；倒序插入让损坏的文件保持清单顺序
    let mut queue = WorkQueue::new();
    let mut corrupt = Vec::new();
    for (entry, state) in states {
        match state {
            LocalState::Satisfied => summary.satisfied += 1,
            LocalState::Corrupt => corrupt.push(DownloadTask::new(entry)),
            LocalState::Missing => {
                summary.missing += 1;
                queue.push_back(DownloadTask::new(entry));
            }
        }
    }
    summary.corrupt = corrupt.len();
    for task in corrupt.into_iter().rev() {
        queue.push_front(task);
    }

    info!(
        "本地检查完成: 完好 {}, 损坏 {}, 缺失 {}, 跳过 {}",
        summary.satisfied, summary.corrupt, summary.missing, summary.skipped
    );

    (queue, summary)
}

async fn dir_exists(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_dir(),
        Err(_) => false,
    }
}

async fn check_local_file(entry: &ManifestEntry, path: PathBuf) -> LocalState {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            warn!("路径不是普通文件，按缺失处理: {}", path.display());
            return LocalState::Missing;
        }
        Err(e) => {
            debug!("文件不存在，加入队列: {} ({})", path.display(), e);
            return LocalState::Missing;
        }
    }

    match md5_file(&path).await {
        Ok(actual) if entry.hash_matches(&actual) => {
            debug!("文件校验通过: {}", path.display());
            LocalState::Satisfied
        }
        Ok(actual) => {
            warn!(
                "文件校验失败，优先重新下载: {} (期望 {}, 实际 {})",
                path.display(),
                entry.expected_hash,
                actual
            );
            LocalState::Corrupt
        }
        Err(e) => {
            warn!("读取文件失败，按缺失处理: {} ({})", path.display(), e);
            LocalState::Missing
        }
    }
}
