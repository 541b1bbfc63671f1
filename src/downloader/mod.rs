pub mod checksum;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod queue;
pub mod reconciler;
pub mod transport;

pub use error::DownloadError;
pub use models::{DownloadTask, TaskStatus};
pub use orchestrator::{DownloadOrchestrator, OrchestratorOptions};
pub use progress::{ProgressSink, ProgressTracker, TerminalProgress};
pub use queue::WorkQueue;
pub use reconciler::{ReconcileSummary, reconcile, reconcile_with_summary};
pub use transport::{ByteSource, ByteStream, HttpSource};
