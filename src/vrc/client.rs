//! VRChat HTTP 客户端配置
//!
//! 负责构造带认证信息的 reqwest 客户端，供各业务模块的 API 共用。

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

/// 默认 API 地址
pub const DEFAULT_API_BASE_URL: &str = "https://api.vrchat.cloud/api/1";

/// 默认 User-Agent（VRChat 要求必须带可识别的 UA）
pub const DEFAULT_USER_AGENT: &str = "VRCAA/0.1.0 contact@sovellus.cc";

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 当前登录用户 ID（更新收藏分组时需要）
    pub user_id: String,
    /// 登录后获得的 auth cookie 值
    pub auth_token: String,
    /// 二步验证通过后获得的 cookie 值，可为空
    pub two_factor_token: String,
    /// HTTP API 基础地址
    pub api_base_url: String,
    /// User-Agent
    pub user_agent: String,
    /// 单个请求超时时间
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(user_id: String, auth_token: String) -> Self {
        Self {
            user_id,
            auth_token,
            two_factor_token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// 拼出 Cookie 请求头
    pub(crate) fn cookie_header(&self) -> String {
        if self.two_factor_token.is_empty() {
            format!("auth={}", self.auth_token)
        } else {
            format!(
                "auth={}; twoFactorAuth={}",
                self.auth_token, self.two_factor_token
            )
        }
    }
}

/// 创建带认证信息的 HTTP 客户端（cookie 通过 default_headers 自动添加）
pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::COOKIE,
        reqwest::header::HeaderValue::from_str(&config.cookie_header())
            .context("无效的 auth token")?,
    );

    let client = reqwest::ClientBuilder::new()
        .default_headers(headers)
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout)
        .build()
        .context("创建 HTTP 客户端失败")?;

    info!(
        "[Client] 创建 HTTP 客户端，用户ID: {}, API: {}",
        config.user_id, config.api_base_url
    );
    Ok(client)
}
