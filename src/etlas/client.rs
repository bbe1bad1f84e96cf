//! Etlas 客户端核心实现模块
//!
//! 统一持有会话提供者、实时通道和各 HTTP API 客户端，
//! 并负责会话列表同步器的生命周期。

use crate::etlas::chat::{
    ChatApi, ChatCreate, ChatListListener, ChatListSyncer, ChatListSyncerConfig, ChatSummary,
    EmptyChatListListener,
};
use crate::etlas::message::{Message, MessageApi, MessageCreate};
use crate::etlas::realtime::RealtimeChannel;
use crate::etlas::scheme::{Scheme, SchemeApi, SchemeCreate, SchemeUpdate};
use crate::etlas::session::SessionProvider;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// HTTP API 基础地址
    pub api_base_url: String,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Etlas 客户端
///
/// 聊天、消息和 Scheme 能力的统一入口
#[derive(Clone)]
pub struct EtlasClient {
    pub(crate) config: ClientConfig,
    // 当前登录态（用户可能未登录）
    session: Arc<dyn SessionProvider>,
    // 实时通道提供者（由调用方注入具体实现）
    channel: Arc<dyn RealtimeChannel>,
    // 各 API 客户端共享同一个 HTTP 连接池
    chat_api: ChatApi,
    message_api: MessageApi,
    scheme_api: SchemeApi,
    // 会话列表监听器（可由调用方注册）
    chat_list_listener: Arc<dyn ChatListListener>,
    // 会话列表同步器（connect 后存在）
    pub(crate) chat_syncer: Option<ChatListSyncer>,
}

impl EtlasClient {
    /// 创建新的客户端
    /// - `config`: 客户端配置
    /// - `session`: 登录态提供者
    /// - `channel`: 实时通道实现
    pub fn new(
        config: ClientConfig,
        session: Arc<dyn SessionProvider>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self {
            chat_api: ChatApi::new(http_client.clone(), config.api_base_url.clone()),
            message_api: MessageApi::new(http_client.clone(), config.api_base_url.clone()),
            scheme_api: SchemeApi::new(http_client, config.api_base_url.clone()),
            config,
            session,
            channel,
            chat_list_listener: Arc::new(EmptyChatListListener),
            chat_syncer: None,
        })
    }

    /// 注册会话列表监听器
    ///
    /// 需在 `connect` 之前调用；连接后注册不影响已启动的同步器
    pub fn set_chat_list_listener(&mut self, listener: Arc<dyn ChatListListener>) {
        if self.chat_syncer.is_some() {
            warn!("[Client] ⚠️ 同步器已启动，新监听器对当前订阅不生效");
        }
        self.chat_list_listener = listener;
    }

    /// 连接：启动会话列表同步（全量拉取 + 实时订阅）
    ///
    /// 未登录时不报错，仅跳过同步；登录态出现后由调用方重新 connect
    pub async fn connect(&mut self) -> Result<()> {
        let Some(user_id) = self.session.current_user_id() else {
            info!("[Client] 当前未登录，跳过会话列表同步");
            return Ok(());
        };

        info!("[Client] 🔗 连接 Etlas (user={})", user_id);

        if let Some(syncer) = self.chat_syncer.take() {
            warn!("[Client] ⚠️ 已存在同步器，先释放");
            syncer.teardown().await;
        }

        let cfg = ChatListSyncerConfig {
            user_id,
            api_base_url: self.config.api_base_url.clone(),
        };
        let syncer = ChatListSyncer::with_fetcher(
            cfg,
            self.channel.clone(),
            self.chat_list_listener.clone(),
            Arc::new(self.chat_api.clone()),
        );
        syncer.start().await?;
        self.chat_syncer = Some(syncer);

        info!("[Client] ✅ 会话列表同步已启动");
        Ok(())
    }

    /// 断开：释放订阅并清空本地会话列表
    pub async fn shutdown(&mut self) {
        if let Some(syncer) = self.chat_syncer.take() {
            info!("[Client] 🧹 关闭会话列表同步");
            syncer.teardown().await;
        }
    }

    /// 当前会话列表快照（未连接时为空）
    pub async fn chats(&self) -> Vec<ChatSummary> {
        match &self.chat_syncer {
            Some(syncer) => syncer.chats().await,
            None => Vec::new(),
        }
    }

    /// 手动触发一次全量重拉
    pub async fn refresh_chats(&self) -> Result<()> {
        let syncer = self
            .chat_syncer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("会话列表同步器未启动"))?;
        syncer.refresh().await
    }

    /// 创建新会话，可选关联一个 Scheme
    pub async fn create_chat(&self, scheme_id: Option<String>) -> Result<ChatSummary> {
        let user_id = self.require_user_id()?;
        self.chat_api
            .create(&ChatCreate { scheme_id, user_id })
            .await
    }

    /// 拉取某个会话的消息历史（时间升序）
    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.message_api.list_by_chat(chat_id).await
    }

    /// 发送一条用户文本消息，返回后端生成的 AI 回复
    pub async fn send_text_message(&self, chat_id: &str, text: &str) -> Result<Message> {
        self.message_api
            .send(&MessageCreate::text(chat_id, text))
            .await
    }

    /// 列出当前用户的 Scheme（分页）
    pub async fn list_schemes(&self, limit: i64, offset: i64) -> Result<Vec<Scheme>> {
        let user_id = self.require_user_id()?;
        self.scheme_api.list_by_user(&user_id, limit, offset).await
    }

    /// 查询某个会话关联的 Scheme
    pub async fn scheme_for_chat(&self, chat_id: &str) -> Result<Option<Scheme>> {
        self.scheme_api.get_by_chat(chat_id).await
    }

    /// 创建 Scheme
    pub async fn create_scheme(
        &self,
        title: String,
        content: String,
        attachment_url: Option<String>,
    ) -> Result<Scheme> {
        let user_id = self.require_user_id()?;
        self.scheme_api
            .create(&SchemeCreate {
                title,
                content,
                attachment_url,
                user_id,
            })
            .await
    }

    /// 更新 Scheme（只提交变更字段）
    pub async fn update_scheme(&self, req: &SchemeUpdate) -> Result<Scheme> {
        self.scheme_api.update(req).await
    }

    fn require_user_id(&self) -> Result<String> {
        self.session
            .current_user_id()
            .ok_or_else(|| anyhow::anyhow!("当前未登录"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etlas::realtime::NullRealtimeChannel;
    use crate::etlas::session::StaticSession;

    #[tokio::test]
    async fn test_connect_without_session_is_noop() {
        let mut client = EtlasClient::new(
            ClientConfig::new(),
            Arc::new(StaticSession::anonymous()),
            Arc::new(NullRealtimeChannel),
        )
        .unwrap();

        client.connect().await.unwrap();
        assert!(client.chat_syncer.is_none());
        assert!(client.chats().await.is_empty());
    }

    #[tokio::test]
    async fn test_operations_require_login() {
        let client = EtlasClient::new(
            ClientConfig::new(),
            Arc::new(StaticSession::anonymous()),
            Arc::new(NullRealtimeChannel),
        )
        .unwrap();

        assert!(client.create_chat(None).await.is_err());
        assert!(client.list_schemes(10, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_without_connect_is_idempotent() {
        let mut client = EtlasClient::new(
            ClientConfig::new(),
            Arc::new(StaticSession::new("u1")),
            Arc::new(NullRealtimeChannel),
        )
        .unwrap();

        client.shutdown().await;
        client.shutdown().await;
        assert!(client.chats().await.is_empty());
    }
}
