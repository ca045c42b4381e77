//! 数据类型

use serde::{Deserialize, Serialize};
use std::fmt;

const TOKEN_MASK_PREFIX_LEN: usize = 6;
const TOKEN_MASK_SUFFIX_LEN: usize = 4;

/// OAuth 应用凭据（每个会话提交一次）
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// client_secret 不能出现在日志里
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// 访问令牌（不跟踪过期时间，由会话或上游拒绝结束生命周期）
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 日志用的脱敏形式：保留前 6 位和后 4 位
    pub fn masked(&self) -> String {
        mask_token(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", self.masked())
    }
}

pub(crate) fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let len = trimmed.len();
    if len <= TOKEN_MASK_PREFIX_LEN + TOKEN_MASK_SUFFIX_LEN || !trimmed.is_ascii() {
        return "*".repeat(len.min(8));
    }

    format!(
        "{}...{}",
        &trimmed[..TOKEN_MASK_PREFIX_LEN],
        &trimmed[len - TOKEN_MASK_SUFFIX_LEN..]
    )
}

/// token 端点返回的令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
}

/// 资源类型；Yandex 用 "dir" 表示文件夹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir", alias = "folder")]
    Folder,
}

/// 公开资源中的一个条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// 下载地址，仅文件有
    #[serde(rename = "file", default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl ResourceEntry {
    pub fn is_file(&self) -> bool {
        self.kind == ResourceType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdef1234567890"), "abcdef...7890");
        assert_eq!(mask_token("abcd"), "****");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::new("my-app", "top-secret-value");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("my-app"));
        assert!(!printed.contains("top-secret-value"));

        let token = AccessToken::new("y0_AgAAAAB1234567890abcdef");
        assert!(!format!("{:?}", token).contains("1234567890"));
    }

    #[test]
    fn test_entry_uses_provider_field_names() {
        let json = r#"{"name":"a","type":"dir","path":"/a"}"#;
        let entry: ResourceEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, ResourceType::Folder);
        assert_eq!(entry.mime_type, None);

        let json = r#"{"name":"b.png","type":"file","path":"/b.png","mime_type":"image/png","file":"https://dl/b"}"#;
        let entry: ResourceEntry = serde_json::from_str(json).unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.download_url.as_deref(), Some("https://dl/b"));

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["file"], "https://dl/b");
        assert_eq!(out["type"], "file");
    }
}
