//! Yandex.Disk 公开链接浏览与打包下载

pub mod config;
pub mod session;
pub mod state;
pub mod web;
pub mod yadisk;

pub use config::Config;
pub use state::AppState;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
