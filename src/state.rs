//! 应用状态

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::session::{MemoryTokenStore, TokenStore};
use crate::yadisk::cache::{MemoryResourceCache, ResourceCache};

pub struct AppState {
    pub config: Config,
    pub client: Client,
    /// 全局公开资源缓存（跨会话共享）
    pub cache: Arc<dyn ResourceCache>,
    pub tokens: Arc<dyn TokenStore>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(MemoryResourceCache::new()),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    /// 注入自定义缓存 / 会话存储（测试用）
    pub fn with_stores(
        config: Config,
        cache: Arc<dyn ResourceCache>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        if config.yandex.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs 必须大于 0"));
        }
        if config.web.fetch_concurrency == 0 {
            return Err(anyhow!("fetch_concurrency 必须大于 0"));
        }
        if config.yandex.public_link_prefixes.is_empty() {
            return Err(anyhow!("public_link_prefixes 不能为空"));
        }

        let client = Client::builder()
            .user_agent(Config::app_ua())
            .connect_timeout(Duration::from_secs(config.yandex.http_timeout_secs))
            .timeout(Duration::from_secs(config.yandex.http_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            cache,
            tokens,
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.web.cache_ttl_secs)
    }
}
