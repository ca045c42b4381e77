//! Yandex.Disk API 模块

pub mod archive;
pub mod cache;
pub mod error;
pub mod filter;
pub mod oauth;
pub mod parser;
pub mod resources;
pub mod types;

// 导出常用类型和函数
pub use archive::{build_archive, ARCHIVE_FILENAME};
pub use cache::{MemoryResourceCache, ResourceCache};
pub use error::{RelayError, Result};
pub use filter::{filter_entries, FileCategory};
pub use oauth::{authorization_url, exchange_code_for_token, refresh_access_token};
pub use parser::{extract_filename, PublicLink, FALLBACK_FILENAME};
pub use resources::resolve_public_resources;
pub use types::{AccessToken, Credentials, ResourceEntry, ResourceType, TokenGrant};
