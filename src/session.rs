//! 会话级令牌存储
//!
//! 每个浏览器会话（cookie 中的 session id）保存自己的 OAuth 凭据和令牌。
//! 处理器负责取出数据，再显式传给 `yadisk` 中的函数。

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

use crate::yadisk::{AccessToken, Credentials, RelayError, Result, TokenGrant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 只接受合法 UUID，防止客户端塞入任意字符串
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 会话所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    /// 已提交凭据，等待授权码
    AwaitingCode,
    Authenticated,
}

pub trait TokenStore: Send + Sync {
    fn credentials(&self, session: &SessionId) -> Option<Credentials>;

    /// 凭据写入后不可修改；同一会话再次写入返回 Validation 错误
    fn store_credentials(&self, session: &SessionId, credentials: Credentials) -> Result<()>;

    fn oauth_state(&self, session: &SessionId) -> Option<String>;

    fn store_oauth_state(&self, session: &SessionId, state: String);

    fn access_token(&self, session: &SessionId) -> Option<AccessToken>;

    fn refresh_token(&self, session: &SessionId) -> Option<String>;

    fn store_grant(&self, session: &SessionId, grant: TokenGrant);

    /// 只丢弃令牌，保留凭据（上游拒绝令牌时使用）
    fn clear_tokens(&self, session: &SessionId);

    /// 清空整个会话
    fn clear(&self, session: &SessionId);

    fn phase(&self, session: &SessionId) -> SessionPhase {
        if self.access_token(session).is_some() {
            SessionPhase::Authenticated
        } else if self.credentials(session).is_some() {
            SessionPhase::AwaitingCode
        } else {
            SessionPhase::Unauthenticated
        }
    }
}

#[derive(Debug, Default)]
struct SessionData {
    credentials: Option<Credentials>,
    oauth_state: Option<String>,
    access_token: Option<AccessToken>,
    refresh_token: Option<String>,
}

/// 进程内会话存储，重启后丢失
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    sessions: Mutex<HashMap<SessionId, SessionData>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, session: &SessionId, f: impl FnOnce(&SessionData) -> Option<T>) -> Option<T> {
        let sessions = self.sessions.lock().ok()?;
        sessions.get(session).and_then(f)
    }

    fn write(&self, session: &SessionId, f: impl FnOnce(&mut SessionData)) {
        if let Ok(mut sessions) = self.sessions.lock() {
            f(sessions.entry(session.clone()).or_default());
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn credentials(&self, session: &SessionId) -> Option<Credentials> {
        self.read(session, |s| s.credentials.clone())
    }

    fn store_credentials(&self, session: &SessionId, credentials: Credentials) -> Result<()> {
        if credentials.client_id.trim().is_empty() || credentials.client_secret.trim().is_empty() {
            return Err(RelayError::Validation(
                "Client ID 和 Client Secret 不能为空".to_string(),
            ));
        }

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| RelayError::Validation("会话存储不可用".to_string()))?;
        let data = sessions.entry(session.clone()).or_default();
        if data.credentials.is_some() {
            return Err(RelayError::Validation(
                "当前会话已保存凭据，请先退出登录".to_string(),
            ));
        }
        data.credentials = Some(credentials);
        Ok(())
    }

    fn oauth_state(&self, session: &SessionId) -> Option<String> {
        self.read(session, |s| s.oauth_state.clone())
    }

    fn store_oauth_state(&self, session: &SessionId, state: String) {
        self.write(session, |s| s.oauth_state = Some(state));
    }

    fn access_token(&self, session: &SessionId) -> Option<AccessToken> {
        self.read(session, |s| s.access_token.clone())
    }

    fn refresh_token(&self, session: &SessionId) -> Option<String> {
        self.read(session, |s| s.refresh_token.clone())
    }

    fn store_grant(&self, session: &SessionId, grant: TokenGrant) {
        self.write(session, |s| {
            s.access_token = Some(grant.access_token);
            // 刷新响应可能不带新的 refresh_token，沿用旧的
            if grant.refresh_token.is_some() {
                s.refresh_token = grant.refresh_token;
            }
            s.oauth_state = None;
        });
    }

    fn clear_tokens(&self, session: &SessionId) {
        self.write(session, |s| {
            s.access_token = None;
            s.refresh_token = None;
        });
    }

    fn clear(&self, session: &SessionId) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(session);
        }
    }
}
