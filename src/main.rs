use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use modpack_dl::auth::{AuthError, AuthManager, SessionStore};
use modpack_dl::common::client::client::NexusClient;
use modpack_dl::common::logger::PrettyLogger;
use modpack_dl::downloader::{
    DownloadOrchestrator, DownloadTask, HttpSource, OrchestratorOptions, ProgressTracker,
    TerminalProgress, WorkQueue, reconcile_with_summary,
};
use modpack_dl::manifest::ManifestExtractor;
use modpack_dl::manifest::models::ManifestEntry;
use modpack_dl::resolver::NexusResolver;

mod cli;

enum RunOutcome {
    // 只做了检查，返回待下载队列
    Checked(WorkQueue),
    // 下载结束，返回最终失败的任务
    Downloaded(Vec<DownloadTask>),
}

/// 处理用户认证
async fn handle_auth(auth_manager: &AuthManager, args: &cli::Cli) -> Result<NexusClient> {
    // 如果提供了cookie，直接使用
    if let Some(cookie) = &args.cookie {
        info!("使用提供的cookie进行登录");
        return Ok(auth_manager.login_by_cookies(cookie)?);
    }

    if let Some(client) = auth_manager.restore_session() {
        return Ok(client);
    }

    match (&args.nexus_user, &args.nexus_pass) {
        (Some(user), Some(pass)) => Ok(auth_manager.login_with_credentials(user, pass).await?),
        _ => Err(AuthError::MissingCredentials.into()),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn run(args: &cli::Cli) -> Result<RunOutcome> {
    PrettyLogger::step_start("解析整合包清单");
    let entries = ManifestExtractor::extract_async(args.autofile.clone())
        .await
        .with_context(|| format!("解析清单失败: {}", args.autofile.display()))?;
    PrettyLogger::step_complete(format!("共 {} 个条目", entries.len()));

    PrettyLogger::step_start("检查本地文件");
    let (queue, summary) =
        reconcile_with_summary(entries, &args.download_dir, args.hash_concurrency).await;
    PrettyLogger::step_complete(format!(
        "完好 {} / 损坏 {} / 缺失 {} / 跳过 {}",
        summary.satisfied, summary.corrupt, summary.missing, summary.skipped
    ));

    if args.check_only {
        return Ok(RunOutcome::Checked(queue));
    }
    if queue.is_empty() {
        return Ok(RunOutcome::Downloaded(Vec::new()));
    }

    PrettyLogger::step_start("登录");
    let auth_manager = AuthManager::new(SessionStore::new(&args.session_file));
    let client = handle_auth(&auth_manager, args).await?;

    PrettyLogger::step_start(format!("下载 {} 个文件", queue.len()));
    let orchestrator = DownloadOrchestrator::new(
        &args.download_dir,
        HttpSource::new(client.clone()),
        OrchestratorOptions {
            game_id: args.game_id,
            stream_timeout: Duration::from_secs(args.stream_timeout),
        },
    );
    let mut resolver = NexusResolver::new(client);
    let mut progress = TerminalProgress::new(ProgressTracker::new(&queue));

    let failed = orchestrator
        .run(queue, &mut resolver, &mut progress)
        .await
        .context("下载中止")?;
    progress.finish();
    debug!(
        "已传输 {}/{} 字节",
        progress.tracker().transferred(),
        progress.tracker().total_size()
    );

    Ok(RunOutcome::Downloaded(failed))
}

fn report_failures(failed: &[DownloadTask]) {
    PrettyLogger::separator();
    PrettyLogger::error("以下模组下载失败，需要手动检查:");
    for task in failed {
        PrettyLogger::failed_entry(
            &task.entry.file_name,
            task.last_error.as_deref().unwrap_or("未知错误"),
        );
    }

    // 安装参数在序列化时会被去掉
    let entries: Vec<&ManifestEntry> = failed.iter().map(|t| &t.entry).collect();
    match serde_json::to_string_pretty(&entries) {
        Ok(json) => error!("失败列表:\n{}", json),
        Err(e) => error!("序列化失败列表出错: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    match run(&args).await {
        Ok(RunOutcome::Checked(queue)) => {
            for task in queue.iter() {
                PrettyLogger::file_info("待下载", &task.entry.file_name);
            }
            if queue.is_empty() {
                PrettyLogger::success("所有文件都已就绪");
                ExitCode::SUCCESS
            } else {
                PrettyLogger::warning(format!("还有 {} 个文件需要下载", queue.len()));
                ExitCode::FAILURE
            }
        }
        Ok(RunOutcome::Downloaded(failed)) if failed.is_empty() => {
            PrettyLogger::success("全部完成！");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Downloaded(failed)) => {
            report_failures(&failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            PrettyLogger::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
