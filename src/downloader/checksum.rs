use std::path::Path;

use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

const BUF_SIZE: usize = 64 * 1024;

/// 计算文件的 MD5，返回小写十六进制
pub async fn md5_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
