use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yadisk_relay::yadisk::{self, AccessToken, FileCategory, PublicLink, ResourceType};
use yadisk_relay::{config::Config, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yadisk_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 用法：yadisk-relay <public_link> [category] [config_path]
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err(anyhow!(
            "用法: {} <public_link> [all|documents|images|video|audio] [config_path]",
            args.first().map(|s| s.as_str()).unwrap_or("yadisk-relay")
        ));
    }

    let category: FileCategory = args.get(2).map(|s| s.as_str()).unwrap_or("all").parse()?;
    let config_path = std::env::var("CONFIG_PATH")
        .ok()
        .or_else(|| args.get(3).cloned())
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    if config.yandex.access_token.is_empty() {
        return Err(anyhow!(
            "未配置 access_token，请在 config.toml 的 [yandex] 中设置或使用 YANDEX_ACCESS_TOKEN"
        ));
    }
    let token = AccessToken::new(config.yandex.access_token.clone());

    let state = Arc::new(AppState::new(config)?);

    let link = PublicLink::parse(&args[1], &state.config.yandex.public_link_prefixes)?;
    let entries = yadisk::resolve_public_resources(&state, &link, &token).await?;
    let entries = yadisk::filter_entries(entries, category);

    if entries.is_empty() {
        tracing::info!("📭 没有符合条件的文件");
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        let kind = match entry.kind {
            ResourceType::File => entry.mime_type.as_deref().unwrap_or("file"),
            ResourceType::Folder => "dir",
        };
        println!("{:>3}. {} [{}]", i + 1, entry.name, kind);
        if let Some(url) = &entry.download_url {
            println!("     {}", url);
        }
    }

    Ok(())
}
