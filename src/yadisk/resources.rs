//! Yandex.Disk 公开资源解析
//!
//! 调用 `GET /v1/disk/public/resources`，把「文件夹」和「单个文件」两种响应
//! 统一成一个扁平的条目列表。子文件夹不会展开。

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::{describe_transport_error, RelayError, Result};
use super::parser::PublicLink;
use super::types::{AccessToken, ResourceEntry, ResourceType};
use crate::AppState;

/// 只请求需要的字段，减小响应体
const RESOURCE_FIELDS: &str = "name,type,path,mime_type,file,\
_embedded.items.name,_embedded.items.type,_embedded.items.path,\
_embedded.items.mime_type,_embedded.items.file";

#[derive(Debug, Deserialize)]
struct PublicResourceResponse {
    #[serde(rename = "_embedded", default)]
    embedded: Option<Embedded>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    items: Option<Vec<serde_json::Value>>,
}

/// 获取公开链接下的条目
///
/// 先查缓存（按链接精确匹配），未命中再请求 API，成功后写入缓存。
/// 请求失败返回 `Upstream` 错误，缓存保持不变；空文件夹返回空列表。
pub async fn resolve_public_resources(
    state: &AppState,
    link: &PublicLink,
    token: &AccessToken,
) -> Result<Vec<ResourceEntry>> {
    if let Some(cached) = state.cache.get(link.as_str()) {
        debug!("📦 命中缓存: {} ({} 项)", link, cached.len());
        return Ok(cached);
    }

    info!("📡 查询公开资源: {}", link);

    let url = format!(
        "{}/public/resources",
        state.config.yandex.api_base.trim_end_matches('/')
    );

    let resp = state
        .client
        .get(&url)
        .header("Authorization", format!("OAuth {}", token.as_str()))
        .header("Accept", "application/json")
        .query(&[("public_key", link.as_str()), ("fields", RESOURCE_FIELDS)])
        .send()
        .await
        .map_err(|e| {
            warn!("❌ 公开资源请求失败: {}", e);
            RelayError::upstream(None, describe_transport_error(&e))
        })?;

    let status = resp.status();
    if !status.is_success() {
        warn!("❌ 公开资源 API 返回 HTTP {}", status.as_u16());
        return Err(RelayError::upstream(
            Some(status.as_u16()),
            format!("HTTP {}", status.as_u16()),
        ));
    }

    let text = resp
        .text()
        .await
        .map_err(|e| RelayError::upstream(Some(status.as_u16()), describe_transport_error(&e)))?;

    let data: PublicResourceResponse = serde_json::from_str(&text).map_err(|e| {
        debug!(
            "📨 无法解析的响应: {}",
            text.chars().take(300).collect::<String>()
        );
        RelayError::upstream(Some(status.as_u16()), format!("解析响应失败: {}", e))
    })?;

    let entries = normalize(data);
    info!("✅ 找到 {} 个条目", entries.len());

    state
        .cache
        .set(link.as_str(), entries.clone(), state.cache_ttl());

    Ok(entries)
}

/// 文件夹 → `_embedded.items`；单个文件 → 自身；其他 → 空列表
fn normalize(data: PublicResourceResponse) -> Vec<ResourceEntry> {
    if let Some(items) = data.embedded.and_then(|e| e.items) {
        // 单个条目格式不对时跳过，不影响整个列表
        return items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ResourceEntry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("⚠️ 跳过无法解析的条目: {}", e);
                    None
                }
            })
            .collect();
    }

    if data.kind.as_deref() == Some("file") {
        return vec![ResourceEntry {
            name: data.name,
            kind: ResourceType::File,
            path: data.path,
            mime_type: data.mime_type,
            download_url: data.file,
        }];
    }

    Vec::new()
}
