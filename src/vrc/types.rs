use serde::{Deserialize, Deserializer};
use tracing::{debug, error};

/// VRChat API 错误响应结构
/// 非 2xx 响应的 body 形如 `{"error":{"message":"...","status_code":401}}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: u16,
}

/// 反序列化数组字段，处理 null 值
pub(crate) fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// 反序列化字符串字段，处理 null 值
pub(crate) fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// 读取 body 并检查状态码，失败时尽量解析 VRChat 的错误结构
async fn read_checked_body(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<Vec<u8>> {
    use anyhow::Context;

    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        let message = serde_json::from_slice::<ApiErrorResponse>(&body_bytes)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body_str.to_string());
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 错误信息: {}",
            operation_name, status, message
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, message));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    Ok(body_bytes.to_vec())
}

/// 通用 HTTP 响应处理函数：检查状态码并反序列化 body
///
/// VRChat 的成功响应没有统一包装，直接就是业务数据。所有 API 都共用此方法。
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    let body_bytes = read_checked_body(response, operation_name).await?;

    serde_json::from_slice::<T>(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name,
            e,
            String::from_utf8_lossy(&body_bytes)
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}

/// 只关心状态码、不关心返回内容的请求（删除、更新等）
pub async fn handle_empty_response(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<()> {
    read_checked_body(response, operation_name).await.map(|_| ())
}
