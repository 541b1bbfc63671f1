use std::collections::VecDeque;

use super::models::{DownloadTask, TaskStatus};

/// 下载队列
///
/// 损坏的文件插到队头优先修复，缺失的文件和重试任务追加到队尾。
#[derive(Debug, Default)]
pub struct WorkQueue {
    tasks: VecDeque<DownloadTask>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, task: DownloadTask) {
        self.tasks.push_back(task);
    }

    /// 插到队头，用于需要优先修复的损坏文件
    pub fn push_front(&mut self, task: DownloadTask) {
        self.tasks.push_front(task);
    }

    /// 重新入队。已经用完重试次数的任务会原样退回给调用方
    pub fn requeue(&mut self, mut task: DownloadTask) -> Result<(), DownloadTask> {
        if !task.can_retry() {
            return Err(task);
        }
        task.status = TaskStatus::Pending;
        self.tasks.push_back(task);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<DownloadTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DownloadTask> {
        self.tasks.iter()
    }

    /// 队列中所有文件大小之和，用作总进度
    pub fn total_size(&self) -> u64 {
        self.tasks.iter().map(|t| t.entry.file_size).fold(0, u64::saturating_add)
    }
}

impl FromIterator<DownloadTask> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = DownloadTask>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}
