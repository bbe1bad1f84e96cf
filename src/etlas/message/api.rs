//! 消息 HTTP API 客户端

use crate::etlas::message::types::{Message, MessageCreate};
use crate::etlas::types::{handle_http_response, Paginated};
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 消息相关的 HTTP API 客户端
#[derive(Clone)]
pub struct MessageApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl MessageApi {
    /// 创建新的消息 API 客户端
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 拉取某个会话的全部消息（POST /messages/by），按时间升序返回用于展示
    pub async fn list_by_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/messages/by", self.api_base_url);

        info!("[MsgAPI] 📡 请求消息历史");
        debug!(
            "[MsgAPI]   请求URL: {}, 会话ID: {}, 请求ID: {}",
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

        let resp: Paginated<Message> = handle_http_response(response, "消息历史").await?;

        let mut messages = resp.data;
        // 展示顺序：最早的消息在前
        messages.sort_by_key(|m| m.created_at());

        info!("[MsgAPI] ✅ 消息历史响应，消息数: {}", messages.len());
        Ok(messages)
    }

    /// 发送一条用户消息（POST /messages/），响应即为后端生成的 AI 回复
    pub async fn send(&self, req: &MessageCreate) -> Result<Message> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/messages/", self.api_base_url);

        info!("[MsgAPI] 📡 发送消息");
        debug!(
            "[MsgAPI]   请求URL: {}, 会话ID: {}, 请求ID: {}",
            url, req.chat_id, request_id
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .context("请求失败")?;

        let reply: Message = handle_http_response(response, "发送消息").await?;
        info!("[MsgAPI] ✅ 收到回复消息: {}", reply.id());
        Ok(reply)
    }
}
