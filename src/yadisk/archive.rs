//! 多文件打包下载
//!
//! 并发下载（数量有上限），全部成功后按输入顺序写入 ZIP。
//! 任意一个文件失败则整体失败，不会返回残缺的压缩包。

use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::{describe_transport_error, RelayError, Result};
use super::parser::extract_filename;
use crate::AppState;

/// 响应头里的压缩包文件名
pub const ARCHIVE_FILENAME: &str = "downloaded_files.zip";

struct FetchedFile {
    name: String,
    bytes: Vec<u8>,
}

/// 下载 `file_urls` 并打包成 ZIP
///
/// - 成员名取自 URL 的 `filename` 参数，缺失时为 `downloaded_file`
/// - 重名成员加 ` (n)` 后缀区分
/// - 空列表返回一个合法的空 ZIP
pub async fn build_archive(state: &AppState, file_urls: &[String]) -> Result<Vec<u8>> {
    info!("🗜️ 开始打包 {} 个文件", file_urls.len());

    let concurrency = state.config.web.fetch_concurrency.max(1);
    let max_total = state.config.web.max_zip_size;
    let total = AtomicU64::new(0);

    // buffered 保持输入顺序；try_collect 遇到第一个错误即停止，其余请求随之丢弃
    let files: Vec<FetchedFile> = stream::iter(file_urls.iter().cloned().enumerate())
        .map(|(index, url)| {
            let total = &total;
            async move {
                let bytes = fetch_file(state, index, &url, total, max_total).await?;
                Ok::<_, RelayError>(FetchedFile {
                    name: extract_filename(&url),
                    bytes,
                })
            }
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    let archive = write_zip(files)?;
    info!("✅ 打包完成: {} 字节", archive.len());
    Ok(archive)
}

async fn fetch_file(
    state: &AppState,
    index: usize,
    file_url: &str,
    total: &AtomicU64,
    max_total: u64,
) -> Result<Vec<u8>> {
    let fetch_err = |message: String| RelayError::Fetch { index, message };
    let over_limit = || fetch_err(format!("压缩包超过大小上限 {} 字节", max_total));

    let url = Url::parse(file_url).map_err(|_| fetch_err("无效的下载地址".to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(fetch_err(format!("不支持的协议: {}", url.scheme())));
    }

    debug!("📥 [{}] 下载 {}", index, url.path());

    let resp = state
        .client
        .get(url)
        .timeout(Duration::from_secs(state.config.web.download_timeout_secs))
        .send()
        .await
        .map_err(|e| {
            warn!("❌ [{}] 下载失败: {}", index, e);
            fetch_err(describe_transport_error(&e))
        })?;

    let status = resp.status();
    if !status.is_success() {
        warn!("❌ [{}] 下载失败: HTTP {}", index, status.as_u16());
        return Err(fetch_err(format!("HTTP {}", status.as_u16())));
    }

    // 有 Content-Length 时先按剩余额度检查，不必把超大的响应读进内存
    if let Some(len) = resp.content_length() {
        if total.load(Ordering::Relaxed).saturating_add(len) > max_total {
            warn!("❌ [{}] 文件过大: {} 字节", index, len);
            return Err(over_limit());
        }
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| fetch_err(describe_transport_error(&e)))?;

    let sum = total.fetch_add(bytes.len() as u64, Ordering::Relaxed) + bytes.len() as u64;
    if sum > max_total {
        return Err(over_limit());
    }

    debug!("✅ [{}] {} 字节", index, bytes.len());
    Ok(bytes.to_vec())
}

fn write_zip(files: Vec<FetchedFile>) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used = HashSet::new();

    for (index, file) in files.into_iter().enumerate() {
        let name = unique_name(&file.name, &mut used);
        let zip_err = |e: &dyn std::fmt::Display| RelayError::Fetch {
            index,
            message: format!("写入压缩包失败: {}", e),
        };

        writer.start_file(name, options).map_err(|e| zip_err(&e))?;
        writer.write_all(&file.bytes).map_err(|e| zip_err(&e))?;
    }

    let cursor = writer.finish().map_err(|e| RelayError::Fetch {
        index: 0,
        message: format!("写入压缩包失败: {}", e),
    })?;

    Ok(cursor.into_inner())
}

/// 重名时在扩展名前加 ` (n)`：cat.png → cat (1).png
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    };

    (1..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or_else(|| name.to_string())
}
