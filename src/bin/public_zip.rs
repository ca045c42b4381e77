//! 命令行打包：公开链接 -> 按类型过滤 -> 下载并打包成 ZIP
//!
//! 用法示例：
//!   cargo run --bin public-zip -- --link "https://disk.yandex.ru/d/xxxx" --category images --out ./photos.zip
//!
//! 可选参数：
//!   --config <path>      配置文件路径（默认 config.toml）
//!   --token <token>      access_token（默认读取 config.yandex.access_token）
//!   --link <url>         公开链接（必填）
//!   --category <name>    all|documents|images|video|audio（默认 all）
//!   --count <n>          只取前 n 个文件（默认全部）
//!   --out <path>         输出文件路径（默认 ./downloaded_files.zip）

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use yadisk_relay::yadisk::{self, AccessToken, FileCategory, PublicLink};
use yadisk_relay::{config::Config, AppState};

#[derive(Debug)]
struct Args {
    config_path: String,
    token: Option<String>,
    link: Option<String>,
    category: FileCategory,
    count: Option<usize>,
    out_path: String,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);

    let mut out = Args {
        config_path: "config.toml".to_string(),
        token: None,
        link: None,
        category: FileCategory::All,
        count: None,
        out_path: format!("./{}", yadisk::ARCHIVE_FILENAME),
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                out.config_path = args.next().ok_or_else(|| anyhow!("--config 缺少参数"))?
            }
            "--token" => out.token = Some(args.next().ok_or_else(|| anyhow!("--token 缺少参数"))?),
            "--link" => out.link = Some(args.next().ok_or_else(|| anyhow!("--link 缺少参数"))?),
            "--category" => {
                let v = args.next().ok_or_else(|| anyhow!("--category 缺少参数"))?;
                out.category = v.parse()?;
            }
            "--count" => {
                let v = args.next().ok_or_else(|| anyhow!("--count 缺少参数"))?;
                out.count = Some(v.parse::<usize>().context("--count 需要是整数")?);
            }
            "--out" => out.out_path = args.next().ok_or_else(|| anyhow!("--out 缺少参数"))?,
            other => return Err(anyhow!("未知参数: {other}")),
        }
    }

    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("yadisk_relay=info")
        .try_init();

    let args = parse_args()?;
    let raw_link = args.link.clone().ok_or_else(|| anyhow!("缺少 --link"))?;

    let config = Config::load(&args.config_path)?;
    let token = args
        .token
        .clone()
        .unwrap_or_else(|| config.yandex.access_token.clone());
    if token.is_empty() {
        return Err(anyhow!("未提供 access_token（--token 或 config.yandex.access_token）"));
    }
    let token = AccessToken::new(token);

    let state = Arc::new(AppState::new(config)?);

    // 1) 解析公开链接并过滤
    let link = PublicLink::parse(&raw_link, &state.config.yandex.public_link_prefixes)?;
    let entries = yadisk::resolve_public_resources(&state, &link, &token).await?;
    let entries = yadisk::filter_entries(entries, args.category);

    let mut urls: Vec<String> = entries
        .into_iter()
        .filter_map(|e| e.download_url)
        .collect();
    if let Some(n) = args.count {
        urls.truncate(n);
    }

    if urls.is_empty() {
        return Err(anyhow!("没有可下载的文件"));
    }
    println!("✅ 选取 {} 个文件，开始打包...", urls.len());

    // 2) 下载并打包
    let archive = yadisk::build_archive(&state, &urls).await?;

    let mut out_file = tokio::fs::File::create(&args.out_path)
        .await
        .context("创建输出文件失败")?;
    out_file
        .write_all(&archive)
        .await
        .context("写入 ZIP 文件失败")?;
    out_file.flush().await?;

    println!("✅ ZIP 已保存: {} bytes -> {}", archive.len(), args.out_path);
    Ok(())
}
