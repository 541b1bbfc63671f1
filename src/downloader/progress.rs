use std::collections::HashMap;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::models::DownloadTask;
use super::queue::WorkQueue;

/// 下载进度的接收方，下载流程只通过它上报字节数
pub trait ProgressSink {
    fn on_task_start(&mut self, _task: &DownloadTask) {}

    fn on_bytes(&mut self, task_id: &str, delta: u64);

    fn on_task_complete(&mut self, task_id: &str);

    // 每次尝试结束都会调用，不论成败
    fn on_task_end(&mut self, _task_id: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
struct TaskProgress {
    file_size: u64,
    credited: u64,
}

/// 进度统计
///
/// 总量在开始时按初始队列计算，之后不再重算。每个任务最多计入它自己的
/// 文件大小，所以重试不会让总进度超过总量，已计入的字节也不会回退。
#[derive(Debug, Default)]
pub struct ProgressTracker {
    tasks: HashMap<String, TaskProgress>,
    total_size: u64,
    transferred: u64,
}

impl ProgressTracker {
    pub fn new(queue: &WorkQueue) -> Self {
        let mut tasks = HashMap::new();
        for task in queue.iter() {
            tasks.insert(
                task.task_id().to_string(),
                TaskProgress {
                    file_size: task.entry.file_size,
                    credited: 0,
                },
            );
        }
        Self {
            tasks,
            total_size: queue.total_size(),
            transferred: 0,
        }
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    pub fn task_bytes(&self, task_id: &str) -> Option<u64> {
        self.tasks.get(task_id).map(|t| t.credited)
    }

    fn credit(&mut self, task_id: &str, delta: u64) {
        let Some(task) = self.tasks.get_mut(task_id) else {
            return;
        };
        let credited = delta.min(task.file_size - task.credited);
        task.credited += credited;
        self.transferred = self.transferred.saturating_add(credited).min(self.total_size);
    }
}

impl ProgressSink for ProgressTracker {
    fn on_bytes(&mut self, task_id: &str, delta: u64) {
        self.credit(task_id, delta);
    }

    fn on_task_complete(&mut self, task_id: &str) {
        // 完成时补齐到文件大小
        let remaining = self
            .tasks
            .get(task_id)
            .map(|t| t.file_size - t.credited)
            .unwrap_or(0);
        self.credit(task_id, remaining);
    }
}

/// 终端进度条：一条总进度加当前文件的进度
pub struct TerminalProgress {
    tracker: ProgressTracker,
    multi_pb: MultiProgress,
    main_pb: ProgressBar,
    file_pb: Option<ProgressBar>,
    file_downloaded: u64,
}

impl TerminalProgress {
    pub fn new(tracker: ProgressTracker) -> Self {
        let multi_pb = MultiProgress::new();
        let main_pb = multi_pb.add(ProgressBar::new(tracker.total_size()));
        if let Ok(style) = ProgressStyle::with_template(
            "{msg:>12} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            main_pb.set_style(style.progress_chars("█▓░"));
        }
        main_pb.set_message("Total");

        Self {
            tracker,
            multi_pb,
            main_pb,
            file_pb: None,
            file_downloaded: 0,
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn finish(&self) {
        self.main_pb.finish_with_message("完成");
    }

    fn sync_main(&self) {
        self.main_pb.set_position(self.tracker.transferred());
    }
}

impl ProgressSink for TerminalProgress {
    fn on_task_start(&mut self, task: &DownloadTask) {
        let pb = self
            .multi_pb
            .add(ProgressBar::new(task.entry.file_size));
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(task.task_id().to_string());
        self.file_pb = Some(pb);
        self.file_downloaded = 0;
    }

    fn on_bytes(&mut self, task_id: &str, delta: u64) {
        self.tracker.on_bytes(task_id, delta);
        self.file_downloaded += delta;
        if let Some(pb) = &self.file_pb {
            pb.set_position(self.file_downloaded);
        }
        self.sync_main();
    }

    fn on_task_complete(&mut self, task_id: &str) {
        self.tracker.on_task_complete(task_id);
        self.sync_main();
    }

    fn on_task_end(&mut self, _task_id: &str) {
        if let Some(pb) = self.file_pb.take() {
            pb.finish_and_clear();
            self.multi_pb.remove(&pb);
        }
    }
}
