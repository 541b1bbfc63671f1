use crate::manifest::models::ManifestEntry;

/// 每个任务最多尝试的次数（首次 + 重试一次）
pub const MAX_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Downloading,
    Validating,
    Complete,
    AwaitingRetry,
    Failed,
}

#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub entry: ManifestEntry,
    pub attempt_count: u8,
    pub status: TaskStatus,
    pub last_error: Option<String>,
}

impl DownloadTask {
    pub fn new(entry: ManifestEntry) -> Self {
        Self {
            entry,
            attempt_count: 0,
            status: TaskStatus::Pending,
            last_error: None,
        }
    }

    // 文件名在一次运行中唯一，直接作为任务 ID
    pub fn task_id(&self) -> &str {
        &self.entry.file_name
    }

    pub fn can_retry(&self) -> bool {
        self.attempt_count < MAX_ATTEMPTS
    }

    /// 记录一次失败的尝试，返回之后是否还能重试
    pub fn record_failure(&mut self, reason: impl Into<String>) -> bool {
        self.attempt_count = (self.attempt_count + 1).min(MAX_ATTEMPTS);
        self.last_error = Some(reason.into());
        self.status = if self.can_retry() {
            TaskStatus::AwaitingRetry
        } else {
            TaskStatus::Failed
        };
        self.status == TaskStatus::AwaitingRetry
    }
}
