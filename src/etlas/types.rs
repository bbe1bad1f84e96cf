//! Etlas API 通用类型与 HTTP 响应处理

use serde::Deserialize;

/// 列表接口的分页包装结构体（对应服务端的 MultiChat / MultiScheme / MultiMessage）
/// data 字段可能为 null 或缺失，反序列化时统一转换为空列表
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub pages: i64,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub data: Vec<T>,
}

/// 列表反序列化函数（支持 null 值）
pub fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    // 先反序列化为 Option<Vec<T>>，以支持 null 值
    let opt: Option<Vec<T>> = Deserialize::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// 通用 HTTP 响应处理函数：校验状态码后直接反序列化为业务结构体
/// 所有 API 都可以共用此方法
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    use anyhow::Context;
    use tracing::{debug, error};

    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body_str));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    // 从 bytes 反序列化（因为 body 已经被消费了）
    serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}
