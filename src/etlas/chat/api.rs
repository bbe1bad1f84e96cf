//! 会话 HTTP API 客户端
//!
//! 负责所有会话相关的 HTTP 请求

use crate::etlas::chat::types::{ChatCreate, ChatSummary};
use crate::etlas::types::{handle_http_response, Paginated};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// 会话列表拉取接口
///
/// 同步器只依赖这个窄接口，测试中注入假实现即可，无需真实后端
#[async_trait]
pub trait ChatListFetcher: Send + Sync {
    /// 拉取某个用户的全量会话列表
    async fn fetch_chat_list(&self, user_id: &str) -> Result<Vec<ChatSummary>>;
}

/// 会话相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ChatApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl ChatApi {
    /// 创建新的会话 API 客户端
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 从服务器获取用户的全量会话列表（POST /chats/by）
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<ChatSummary>> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/chats/by", self.api_base_url);

        info!("[ChatAPI] 📡 请求会话列表");
        debug!("[ChatAPI]   请求URL: {}", url);
        debug!("[ChatAPI]   用户ID: {}, 请求ID: {}", user_id, request_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "user_id": user_id,
            }))
            .send()
            .await
            .context("请求失败")?;

        let resp: Paginated<ChatSummary> = handle_http_response(response, "会话列表").await?;

        info!("[ChatAPI] ✅ 会话列表响应，会话数: {}", resp.data.len());
        debug!(
            "[ChatAPI]   会话ID列表: {:?}",
            resp.data.iter().map(|c| &c.id).collect::<Vec<_>>()
        );

        Ok(resp.data)
    }

    /// 创建新会话（POST /chats/），可选关联一个 Scheme
    pub async fn create(&self, req: &ChatCreate) -> Result<ChatSummary> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/chats/", self.api_base_url);

        info!("[ChatAPI] 📡 请求创建会话");
        debug!(
            "[ChatAPI]   请求URL: {}, 用户ID: {}, SchemeID: {:?}, 请求ID: {}",
            url, req.user_id, req.scheme_id, request_id
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .context("请求失败")?;

        let chat: ChatSummary = handle_http_response(response, "创建会话").await?;
        info!("[ChatAPI] ✅ 会话创建成功: {}", chat.id);
        Ok(chat)
    }
}

#[async_trait]
impl ChatListFetcher for ChatApi {
    async fn fetch_chat_list(&self, user_id: &str) -> Result<Vec<ChatSummary>> {
        self.list_by_user(user_id).await
    }
}
