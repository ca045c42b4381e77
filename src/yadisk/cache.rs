//! 公开资源的短时缓存
//!
//! 按公开链接缓存（不区分用户），所有会话共享。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::ResourceEntry;

/// 默认缓存时间（秒）
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub trait ResourceCache: Send + Sync {
    /// 未命中或已过期时返回 None
    fn get(&self, key: &str) -> Option<Vec<ResourceEntry>>;

    /// 覆盖写入（后写者生效）
    fn set(&self, key: &str, entries: Vec<ResourceEntry>, ttl: Duration);

    fn invalidate(&self, key: &str);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    entries: Vec<ResourceEntry>,
    expires_at: Instant,
}

/// 进程内缓存
#[derive(Debug, Default)]
pub struct MemoryResourceCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceCache for MemoryResourceCache {
    fn get(&self, key: &str) -> Option<Vec<ResourceEntry>> {
        let mut inner = self.inner.lock().ok()?;
        if let Some(entry) = inner.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.entries.clone());
            }
        }
        inner.remove(key);
        None
    }

    fn set(&self, key: &str, entries: Vec<ResourceEntry>, ttl: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            let now = Instant::now();
            // 顺便清掉过期项，防止无限增长
            inner.retain(|_, e| e.expires_at > now);
            inner.insert(
                key.to_string(),
                CacheEntry {
                    entries,
                    expires_at: now + ttl,
                },
            );
        }
    }

    fn invalidate(&self, key: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.remove(key);
        }
    }
}
