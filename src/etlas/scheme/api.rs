//! Scheme HTTP API 客户端
//!
//! /schemes/by 接受两种请求体：按用户列出（user_id + 分页）
//! 或查询某个会话关联的 Scheme（chat_id），分别建模为两个方法

use crate::etlas::scheme::types::{Scheme, SchemeCreate, SchemeUpdate};
use crate::etlas::types::{handle_http_response, Paginated};
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// Scheme 相关的 HTTP API 客户端
#[derive(Clone)]
pub struct SchemeApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl SchemeApi {
    /// 创建新的 Scheme API 客户端
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 列出用户的 Scheme（POST /schemes/by，带分页）
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Scheme>> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/schemes/by", self.api_base_url);

        info!("[SchemeAPI] 📡 请求 Scheme 列表");
        debug!(
            "[SchemeAPI]   请求URL: {}, 用户ID: {}, limit: {}, offset: {}, 请求ID: {}",
            url, user_id, limit, offset, request_id
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "user_id": user_id,
                "limit": limit,
                "offset": offset,
            }))
            .send()
            .await
            .context("请求失败")?;

        let resp: Paginated<Scheme> = handle_http_response(response, "Scheme 列表").await?;
        info!("[SchemeAPI] ✅ Scheme 列表响应，数量: {}", resp.data.len());
        Ok(resp.data)
    }

    /// 查询某个会话关联的 Scheme（POST /schemes/by，chat_id 请求体）
    ///
    /// 服务端返回列表，取第一个；会话未关联 Scheme 时返回 None
    pub async fn get_by_chat(&self, chat_id: &str) -> Result<Option<Scheme>> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/schemes/by", self.api_base_url);

        info!("[SchemeAPI] 📡 请求会话关联的 Scheme");
        debug!(
            "[SchemeAPI]   请求URL: {}, 会话ID: {}, 请求ID: {}",
            url, chat_id, request_id
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "chat_id": chat_id,
            }))
            .send()
            .await
            .context("请求失败")?;

        let resp: Paginated<Scheme> = handle_http_response(response, "会话 Scheme").await?;
        Ok(resp.data.into_iter().next())
    }

    /// 创建 Scheme（POST /schemes/）
    pub async fn create(&self, req: &SchemeCreate) -> Result<Scheme> {
        let url = format!("{}/schemes/", self.api_base_url);

        info!("[SchemeAPI] 📡 请求创建 Scheme: {}", req.title);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .context("请求失败")?;

        let scheme: Scheme = handle_http_response(response, "创建 Scheme").await?;
        info!("[SchemeAPI] ✅ Scheme 创建成功: {}", scheme.id);
        Ok(scheme)
    }

    /// 更新 Scheme（PUT /schemes/），只提交变更字段
    pub async fn update(&self, req: &SchemeUpdate) -> Result<Scheme> {
        let url = format!("{}/schemes/", self.api_base_url);

        info!("[SchemeAPI] 📡 请求更新 Scheme: {}", req.id);
        let response = self
            .client
            .put(&url)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .context("请求失败")?;

        let scheme: Scheme = handle_http_response(response, "更新 Scheme").await?;
        info!("[SchemeAPI] ✅ Scheme 更新成功: {}", scheme.id);
        Ok(scheme)
    }
}
