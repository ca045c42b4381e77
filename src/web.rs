//! Web 服务器模块

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::session::{SessionId, SessionPhase};
use crate::yadisk::{
    self, AccessToken, Credentials, FileCategory, PublicLink, RelayError, ResourceEntry,
};
use crate::AppState;

static HTML_TEMPLATE: &str = include_str!("../templates/index.html");
static LOGIN_TEMPLATE: &str = include_str!("../templates/login.html");

pub const SESSION_COOKIE_NAME: &str = "yadisk_session";

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseRequest {
    pub public_link: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub success: bool,
    pub files: Vec<ResourceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub phase: SessionPhase,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

impl AuthResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            authorization_url: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            authorization_url: None,
        }
    }
}

fn session_id(cookies: &CookieJar) -> Option<SessionId> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .and_then(|c| SessionId::parse(c.value()))
}

fn session_cookie(state: &AppState, session: &SessionId) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.config.web.secure_cookie);
    cookie.set_max_age(time::Duration::days(1));
    cookie
}

/// 取出当前会话的令牌；没有则重定向到登录页
fn require_token(
    state: &AppState,
    cookies: &CookieJar,
) -> Result<(SessionId, AccessToken), Redirect> {
    let session = session_id(cookies).ok_or_else(|| Redirect::to("/login"))?;
    let token = state
        .tokens
        .access_token(&session)
        .ok_or_else(|| Redirect::to("/login"))?;
    Ok((session, token))
}

/// 首页（需要已授权）
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
) -> Result<Html<&'static str>, Redirect> {
    require_token(&state, &cookies)?;
    Ok(Html(HTML_TEMPLATE))
}

/// 登录页面
pub async fn login_page_handler() -> Html<&'static str> {
    Html(LOGIN_TEMPLATE)
}

/// 健康检查端点（不需要认证）
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION,
    })
}

pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
) -> Json<SessionResponse> {
    let phase = session_id(&cookies)
        .map(|s| state.tokens.phase(&s))
        .unwrap_or(SessionPhase::Unauthenticated);
    Json(SessionResponse { phase })
}

/// 提交凭据，返回授权页地址
pub async fn auth_start_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
    Json(credentials): Json<Credentials>,
) -> (StatusCode, CookieJar, Json<AuthResponse>) {
    let session = session_id(&cookies).unwrap_or_else(SessionId::generate);
    let cookies = cookies.add(session_cookie(&state, &session));

    if let Err(e) = state.tokens.store_credentials(&session, credentials.clone()) {
        warn!("❌ 保存凭据失败: {}", e);
        return (
            StatusCode::BAD_REQUEST,
            cookies,
            Json(AuthResponse::failed(e.to_string())),
        );
    }

    let oauth_state = Uuid::new_v4().simple().to_string();
    match yadisk::authorization_url(&state.config, &credentials, &oauth_state) {
        Ok(url) => {
            state.tokens.store_oauth_state(&session, oauth_state);
            info!("🔐 生成授权地址: client_id={}", credentials.client_id);
            (
                StatusCode::OK,
                cookies,
                Json(AuthResponse {
                    success: true,
                    message: "请在打开的页面中完成授权".to_string(),
                    authorization_url: Some(url.to_string()),
                }),
            )
        }
        Err(e) => {
            error!("❌ 生成授权地址失败: {}", e);
            state.tokens.clear(&session);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                cookies,
                Json(AuthResponse::failed(e.to_string())),
            )
        }
    }
}

/// OAuth 回调：用授权码换令牌，成功跳首页，失败回登录页
pub async fn auth_callback_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    if let Some(err) = params.error {
        warn!("❌ 用户拒绝授权或授权出错: {}", err);
        return Redirect::to("/login");
    }

    let Some(session) = session_id(&cookies) else {
        return Redirect::to("/login");
    };
    let Some(code) = params.code.filter(|c| !c.trim().is_empty()) else {
        return Redirect::to("/login");
    };

    // 只接受由本会话发起、尚未使用过的授权请求
    match (state.tokens.oauth_state(&session), params.state.as_deref()) {
        (Some(expected), Some(got)) if expected == got => {}
        _ => {
            warn!("❌ OAuth state 不匹配或缺失，拒绝回调");
            if state.tokens.phase(&session) == SessionPhase::Authenticated {
                return Redirect::to("/");
            }
            state.tokens.clear(&session);
            return Redirect::to("/login");
        }
    }

    match exchange_and_store(&state, &session, &code).await {
        Ok(()) => Redirect::to("/"),
        Err(e) => {
            warn!("❌ {}", e);
            Redirect::to("/login")
        }
    }
}

/// 手动输入授权码（验证码页面模式）
pub async fn auth_code_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
    Json(req): Json<CodeRequest>,
) -> (StatusCode, Json<AuthResponse>) {
    let Some(session) = session_id(&cookies) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(AuthResponse::failed("请先提交 Client ID 和 Client Secret")),
        );
    };

    match exchange_and_store(&state, &session, &req.code).await {
        Ok(()) => (StatusCode::OK, Json(AuthResponse::ok("授权成功"))),
        Err(e @ RelayError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, Json(AuthResponse::failed(e.to_string())))
        }
        Err(e) => {
            warn!("❌ {}", e);
            (StatusCode::UNAUTHORIZED, Json(AuthResponse::failed(e.to_string())))
        }
    }
}

/// 换取令牌并写入会话；授权失败时清空会话以便重新授权
async fn exchange_and_store(
    state: &AppState,
    session: &SessionId,
    code: &str,
) -> yadisk::Result<()> {
    let credentials = state.tokens.credentials(session).ok_or_else(|| {
        RelayError::Validation("请先提交 Client ID 和 Client Secret".to_string())
    })?;

    match yadisk::exchange_code_for_token(state, code, &credentials).await {
        Ok(grant) => {
            state.tokens.store_grant(session, grant);
            info!("✅ 会话授权成功");
            Ok(())
        }
        Err(e) => {
            state.tokens.clear(session);
            Err(e)
        }
    }
}

/// 刷新 access_token
pub async fn auth_refresh_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
) -> Response {
    let Some(session) = session_id(&cookies) else {
        return Redirect::to("/login").into_response();
    };
    let (Some(credentials), Some(refresh_token)) = (
        state.tokens.credentials(&session),
        state.tokens.refresh_token(&session),
    ) else {
        return Redirect::to("/login").into_response();
    };

    match yadisk::refresh_access_token(&state, &refresh_token, &credentials).await {
        Ok(grant) => {
            state.tokens.store_grant(&session, grant);
            Json(AuthResponse::ok("令牌已刷新")).into_response()
        }
        Err(e) => {
            warn!("❌ 刷新令牌失败: {}", e);
            state.tokens.clear_tokens(&session);
            Redirect::to("/login").into_response()
        }
    }
}

/// 退出登录：清空会话并删除 cookie
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
) -> (CookieJar, Json<AuthResponse>) {
    if let Some(session) = session_id(&cookies) {
        state.tokens.clear(&session);
    }

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(0));
    cookie.set_http_only(true);

    (cookies.remove(cookie), Json(AuthResponse::ok("已退出登录")))
}

fn browse_error(status: StatusCode, e: &RelayError) -> Response {
    (
        status,
        Json(BrowseResponse {
            success: false,
            files: Vec::new(),
            error: Some(e.to_string()),
        }),
    )
        .into_response()
}

/// 浏览公开链接（需要已授权）
pub async fn browse_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
    Json(req): Json<BrowseRequest>,
) -> Response {
    let (session, token) = match require_token(&state, &cookies) {
        Ok(v) => v,
        Err(redirect) => return redirect.into_response(),
    };

    let link = match PublicLink::parse(&req.public_link, &state.config.yandex.public_link_prefixes)
    {
        Ok(link) => link,
        Err(e) => {
            warn!("❌ 公开链接验证失败: {}", e);
            return browse_error(StatusCode::BAD_REQUEST, &e);
        }
    };

    let category = match req.category.parse::<FileCategory>() {
        Ok(c) => c,
        Err(e) => return browse_error(StatusCode::BAD_REQUEST, &e),
    };

    info!("📥 浏览请求: {} (类型: {})", link, category.as_str());

    match yadisk::resolve_public_resources(&state, &link, &token).await {
        Ok(entries) => {
            let files = yadisk::filter_entries(entries, category);
            Json(BrowseResponse {
                success: true,
                files,
                error: None,
            })
            .into_response()
        }
        Err(e) if e.is_unauthorized() => {
            warn!("⚠️ 令牌被拒绝，需要重新授权");
            state.tokens.clear_tokens(&session);
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            error!("❌ {}", e);
            browse_error(StatusCode::BAD_GATEWAY, &e)
        }
    }
}

/// 打包下载所选文件（需要已授权）
pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    cookies: CookieJar,
    Json(req): Json<DownloadRequest>,
) -> Response {
    if let Err(redirect) = require_token(&state, &cookies) {
        return redirect.into_response();
    }

    let files: Vec<String> = req
        .files
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    if files.is_empty() {
        return Redirect::to("/").into_response();
    }

    match yadisk::build_archive(&state, &files).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", yadisk::ARCHIVE_FILENAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("❌ 打包失败: {}", e);
            Redirect::to("/").into_response()
        }
    }
}

/// 创建 Web 路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler))
        .route("/health", get(health_handler))
        .route("/auth/callback", get(auth_callback_handler))
        .route("/api/session", get(session_handler))
        .route("/api/auth", post(auth_start_handler))
        .route("/api/auth/code", post(auth_code_handler))
        .route("/api/auth/refresh", post(auth_refresh_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/browse", post(browse_handler))
        .route("/api/download", post(download_handler))
        .with_state(state)
}
