//! 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    /// 授权码换取 / 刷新令牌失败
    #[error("授权失败: {0}")]
    Auth(String),

    /// 公开资源查询失败（网络错误或非 2xx）
    #[error("获取 Yandex.Disk 数据失败: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// 输入不合法（链接前缀不对等）
    #[error("{0}")]
    Validation(String),

    /// 打包时某个文件下载失败
    #[error("第 {index} 个文件下载失败: {message}")]
    Fetch { index: usize, message: String },
}

impl RelayError {
    pub(crate) fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// 上游明确拒绝了令牌
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Upstream { status: Some(401), .. })
    }
}

/// 网络错误只保留类别，不含 URL 和请求体
pub(crate) fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "请求超时".to_string()
    } else if e.is_connect() {
        "连接失败".to_string()
    } else if e.is_decode() || e.is_body() {
        "读取响应失败".to_string()
    } else {
        "网络请求失败".to_string()
    }
}
