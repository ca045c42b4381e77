//! 链接解析

use std::fmt;
use url::Url;

use super::error::{RelayError, Result};

/// 没有 filename 参数时使用的文件名
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// 已校验的 Yandex.Disk 公开链接
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicLink(String);

impl PublicLink {
    /// 校验公开链接
    ///
    /// 要求：
    /// - 去掉首尾空白后是合法的绝对 URL
    /// - 以 `prefixes` 中的某个前缀开头（如 https://disk.yandex.ru/）
    pub fn parse(raw: &str, prefixes: &[String]) -> Result<Self> {
        let link = raw.trim();
        if link.is_empty() {
            return Err(RelayError::Validation("公开链接不能为空".to_string()));
        }

        Url::parse(link).map_err(|_| RelayError::Validation("无效的 URL 格式".to_string()))?;

        if !prefixes.iter().any(|p| link.starts_with(p.as_str())) {
            return Err(RelayError::Validation(
                "链接必须是有效的 Yandex.Disk 公开链接".to_string(),
            ));
        }

        Ok(Self(link.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 从下载地址的 `filename` 查询参数提取文件名
///
/// - 参数会被 URL 解码
/// - 只保留最后一段，避免压缩包内出现 `../` 之类的路径
/// - 取不到时返回 [`FALLBACK_FILENAME`]
pub fn extract_filename(file_url: &str) -> String {
    Url::parse(file_url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "filename")
                .map(|(_, v)| v.into_owned())
        })
        .and_then(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
