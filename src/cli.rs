use clap::Parser;
use std::path::PathBuf;

use modpack_dl::auth::DEFAULT_SESSION_FILE;
use modpack_dl::downloader::reconciler::DEFAULT_HASH_CONCURRENCY;
use modpack_dl::resolver::DEFAULT_GAME_ID;

/// 整合包模组下载器
#[derive(Parser, Debug)]
#[command(name = "mpdl")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "根据整合包清单补全本地缺失或损坏的模组文件", long_about = None)]
pub struct Cli {
    /// 整合包清单压缩包
    #[arg(long, env = "AUTOFILE", value_name = "PATH")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub autofile: PathBuf,

    /// 模组保存目录
    #[arg(long, env = "DOWNLOAD_DIR", value_name = "DIR")]
    #[arg(default_value = "./downloads")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub download_dir: PathBuf,

    /// 登录用户名
    #[arg(long, env = "NEXUS_USER", value_name = "USER")]
    pub nexus_user: Option<String>,

    /// 登录密码
    #[arg(long, env = "NEXUS_PASS", value_name = "PASS", hide_env_values = true)]
    pub nexus_pass: Option<String>,

    /// Cookie (JSON 数组或文件路径)
    #[arg(long, env = "COOKIE", value_name = "COOKIE", hide_env_values = true)]
    #[arg(help = "登录后导出的 Cookie，提供后跳过登录")]
    pub cookie: Option<String>,

    /// 会话文件
    #[arg(long, value_name = "FILE", default_value = DEFAULT_SESSION_FILE)]
    pub session_file: PathBuf,

    #[arg(long, value_name = "GAME_ID", default_value_t = DEFAULT_GAME_ID)]
    pub game_id: u64,

    /// 本地校验的并发数
    #[arg(long, value_name = "N", default_value_t = DEFAULT_HASH_CONCURRENCY)]
    pub hash_concurrency: usize,

    /// 下载时多久没有收到数据算超时（秒）
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub stream_timeout: u64,

    /// 只检查本地文件，不下载
    #[arg(long)]
    pub check_only: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}
