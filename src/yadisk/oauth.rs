//! Yandex OAuth：授权地址、授权码换令牌、刷新令牌

use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{describe_transport_error, RelayError, Result};
use super::types::{AccessToken, Credentials, TokenGrant};
use crate::config::Config;
use crate::AppState;

/// 生成授权页地址，`state` 用于回调时校验
pub fn authorization_url(config: &Config, credentials: &Credentials, state: &str) -> Result<Url> {
    let mut url = Url::parse(&config.yandex.auth_url)
        .map_err(|e| RelayError::Auth(format!("auth_url 配置无效: {}", e)))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", credentials.client_id.trim())
            .append_pair("state", state);
        if !config.yandex.redirect_uri.is_empty() {
            query.append_pair("redirect_uri", &config.yandex.redirect_uri);
        }
    }

    Ok(url)
}

/// 用授权码换取 access_token
pub async fn exchange_code_for_token(
    state: &AppState,
    code: &str,
    credentials: &Credentials,
) -> Result<TokenGrant> {
    let code = code.trim();
    if code.is_empty() {
        return Err(RelayError::Auth("授权码为空".to_string()));
    }

    debug!("🔑 用授权码换取 access_token...");

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", credentials.client_id.trim()),
        ("client_secret", credentials.client_secret.trim()),
    ];
    let grant = request_token(state, &form).await?;

    info!("✅ 已获取 access_token: {}", grant.access_token.masked());
    Ok(grant)
}

/// 用 refresh_token 换新的 access_token
pub async fn refresh_access_token(
    state: &AppState,
    refresh_token: &str,
    credentials: &Credentials,
) -> Result<TokenGrant> {
    if refresh_token.trim().is_empty() {
        return Err(RelayError::Auth("没有可用的 refresh_token".to_string()));
    }

    debug!("🔄 刷新 access_token...");

    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.trim()),
        ("client_id", credentials.client_id.trim()),
        ("client_secret", credentials.client_secret.trim()),
    ];
    let grant = request_token(state, &form).await?;

    info!("✅ 已刷新 access_token: {}", grant.access_token.masked());
    Ok(grant)
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<serde_json::Value>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

async fn request_token(state: &AppState, form: &[(&str, &str)]) -> Result<TokenGrant> {
    // 错误信息只用 reqwest 的错误类别，不带请求体，避免泄露 client_secret
    let resp = state
        .client
        .post(&state.config.yandex.token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| RelayError::Auth(describe_transport_error(&e)))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| RelayError::Auth(describe_transport_error(&e)))?;

    let parsed: Option<TokenResponse> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let detail = parsed
            .as_ref()
            .map(provider_error)
            .unwrap_or_else(|| "响应无法解析".to_string());
        warn!("❌ token 端点返回 HTTP {}: {}", status.as_u16(), detail);
        return Err(RelayError::Auth(format!("HTTP {}: {}", status.as_u16(), detail)));
    }

    let token = parsed.ok_or_else(|| RelayError::Auth("token 响应不是合法 JSON".to_string()))?;

    if token.error.is_some() {
        return Err(RelayError::Auth(provider_error(&token)));
    }

    let access_token = match token.access_token {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        _ => return Err(RelayError::Auth("token 响应缺少 access_token".to_string())),
    };

    Ok(TokenGrant {
        access_token: AccessToken::new(access_token),
        refresh_token: token.refresh_token.filter(|s| !s.is_empty()),
    })
}

fn provider_error(token: &TokenResponse) -> String {
    match (&token.error, &token.error_description) {
        (Some(err), Some(desc)) => format!("{}: {}", err, desc),
        (Some(err), None) => err.clone(),
        (None, Some(desc)) => desc.clone(),
        (None, None) => "未知错误".to_string(),
    }
}
