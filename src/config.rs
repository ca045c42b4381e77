//! 配置文件加载

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub yandex: YandexConfig,
    #[serde(default)] // 没有 [web] 就用默认值
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YandexConfig {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Disk REST API 根地址
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// OAuth 回调地址；留空则使用应用在 Yandex OAuth 中登记的地址
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// 允许的公开链接前缀
    #[serde(default = "default_public_link_prefixes")]
    pub public_link_prefixes: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// 命令行工具使用的令牌（Web 服务使用会话中的令牌）
    #[serde(default = "default_access_token")]
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// 公开资源缓存时间（秒）
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 打包时同时下载的文件数
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// 单个文件下载超时（秒）
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// ZIP 内容总大小上限（字节），默认 2GB
    #[serde(default = "default_max_zip_size")]
    pub max_zip_size: u64,
    /// HTTPS 部署时打开，会话 cookie 带 Secure
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_base: default_api_base(),
            redirect_uri: default_redirect_uri(),
            public_link_prefixes: default_public_link_prefixes(),
            http_timeout_secs: default_http_timeout_secs(),
            access_token: default_access_token(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_concurrency: default_fetch_concurrency(),
            download_timeout_secs: default_download_timeout_secs(),
            max_zip_size: default_max_zip_size(),
            secure_cookie: false,
        }
    }
}

fn default_auth_url() -> String {
    "https://oauth.yandex.ru/authorize".to_string()
}

fn default_token_url() -> String {
    "https://oauth.yandex.ru/token".to_string()
}

fn default_api_base() -> String {
    "https://cloud-api.yandex.net/v1/disk".to_string()
}

fn default_redirect_uri() -> String {
    std::env::var("YANDEX_REDIRECT_URI").unwrap_or_default()
}

fn default_public_link_prefixes() -> Vec<String> {
    vec![
        "https://disk.yandex.ru/".to_string(),
        "https://yadi.sk/".to_string(),
    ]
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_access_token() -> String {
    std::env::var("YANDEX_ACCESS_TOKEN").unwrap_or_default()
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5200)
}

fn default_cache_ttl_secs() -> u64 {
    crate::yadisk::cache::DEFAULT_CACHE_TTL_SECS
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_download_timeout_secs() -> u64 {
    300
}

fn default_max_zip_size() -> u64 {
    // 可通过 MAX_ZIP_SIZE 环境变量覆盖（单位：字节）
    std::env::var("MAX_ZIP_SIZE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(2 * 1024 * 1024 * 1024)
}

impl Config {
    /// 读取配置文件；文件不存在时使用默认值和环境变量
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("读取配置文件失败: {}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("解析配置文件失败")?;
        Ok(config)
    }

    pub fn app_ua() -> &'static str {
        concat!("yadisk-relay/", env!("CARGO_PKG_VERSION"))
    }
}
