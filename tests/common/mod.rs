//! 测试公用工具：把 Yandex 的各个端点指向 wiremock 服务器

#![allow(dead_code)]

use std::sync::Arc;
use wiremock::MockServer;

use yadisk_relay::session::MemoryTokenStore;
use yadisk_relay::yadisk::{MemoryResourceCache, ResourceCache};
use yadisk_relay::{config::Config, AppState};

pub fn mock_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.yandex.auth_url = format!("{}/authorize", server.uri());
    config.yandex.token_url = format!("{}/token", server.uri());
    config.yandex.api_base = format!("{}/v1/disk", server.uri());
    config.yandex.redirect_uri = "http://localhost:5200/auth/callback".to_string();
    config.yandex.http_timeout_secs = 5;
    config.web.download_timeout_secs = 5;
    config
}

pub fn mock_state(server: &MockServer) -> AppState {
    AppState::new(mock_config(server)).unwrap()
}

pub fn mock_state_with_cache(server: &MockServer, cache: Arc<dyn ResourceCache>) -> AppState {
    AppState::with_stores(mock_config(server), cache, Arc::new(MemoryTokenStore::new())).unwrap()
}

pub fn memory_cache() -> Arc<MemoryResourceCache> {
    Arc::new(MemoryResourceCache::new())
}

/// 所有端点都指向一个没有监听的端口
pub fn unreachable_state() -> AppState {
    let mut config = Config::default();
    config.yandex.token_url = "http://127.0.0.1:1/token".to_string();
    config.yandex.api_base = "http://127.0.0.1:1/v1/disk".to_string();
    config.yandex.http_timeout_secs = 2;
    AppState::new(config).unwrap()
}
