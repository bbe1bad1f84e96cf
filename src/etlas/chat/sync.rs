//! 会话列表同步服务层
//!
//! 全量拉取 + 实时增量事件合并，保证列表按 created_at 降序且 id 唯一。
//! 每个活跃用户会话最多持有一个逻辑订阅；通道异常时安排一次延迟重拉（5 秒），
//! 不自动重建订阅 —— 订阅生命周期与组件存活绑定，避免失控的重连循环。
//!
//! 并发模型：拉取结果和事件回调都通过同一把锁串行写入共享状态，按投递顺序
//! 逐条应用。迟到的拉取结果被视为权威快照整体覆盖，与并发事件之间的窄竞争
//! 窗口是可接受的最终一致性间隙，后续事件或刷新会自行修正。在途拉取通过
//! 代数计数器守护：teardown 或新一轮拉取会使旧结果失效，不会复活过期列表。

use crate::etlas::chat::api::{ChatApi, ChatListFetcher};
use crate::etlas::chat::listener::{ChatListListener, EmptyChatListListener};
use crate::etlas::chat::state::{Applied, ChatListState};
use crate::etlas::chat::types::ChatSummary;
use crate::etlas::realtime::{
    ChannelEvents, ChannelHandle, ChannelSpec, ChannelStatus, RealtimeChannel, RowChange,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 通道异常后延迟重拉的间隔
const CHANNEL_ERROR_RESYNC_DELAY: Duration = Duration::from_secs(5);

/// 会话列表同步器配置
pub struct ChatListSyncerConfig {
    /// 用户 ID
    pub user_id: String,
    /// API 基础 URL
    pub api_base_url: String,
}

/// 会话列表同步器
#[derive(Clone)]
pub struct ChatListSyncer {
    inner: Arc<SyncerInner>,
}

/// 同步器与后台任务共享的内部状态
struct SyncerInner {
    config: ChatListSyncerConfig,
    /// 会话列表拉取接口
    fetcher: Arc<dyn ChatListFetcher>,
    /// 实时通道提供者（显式传入，不使用模块级单例）
    channel: Arc<dyn RealtimeChannel>,
    /// 会话列表监听器
    listener: Arc<dyn ChatListListener>,
    /// 本地会话列表（唯一物化状态）
    state: Mutex<ChatListState>,
    /// 拉取代数：teardown 或新一轮拉取会使旧的在途结果失效
    generation: AtomicU64,
    /// 当前订阅句柄
    subscription: Mutex<Option<ChannelHandle>>,
    /// 通道异常后的延迟重拉任务（最多同时存在一个）
    resync_task: Mutex<Option<JoinHandle<()>>>,
    /// 通道异常标记（Subscribed 时清除）
    channel_error: AtomicBool,
}

impl ChatListSyncer {
    /// 创建新的会话列表同步器（使用默认空监听器）
    pub fn new(config: ChatListSyncerConfig, channel: Arc<dyn RealtimeChannel>) -> Result<Self> {
        Self::with_listener(config, channel, Arc::new(EmptyChatListListener))
    }

    /// 创建新的会话列表同步器（带自定义监听器）
    pub fn with_listener(
        config: ChatListSyncerConfig,
        channel: Arc<dyn RealtimeChannel>,
        listener: Arc<dyn ChatListListener>,
    ) -> Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .build()
            .context("创建 HTTP 客户端失败")?;
        let fetcher = Arc::new(ChatApi::new(http_client, config.api_base_url.clone()));
        Ok(Self::with_fetcher(config, channel, listener, fetcher))
    }

    /// 创建新的会话列表同步器（注入拉取实现，测试或共享 HTTP 客户端时使用）
    pub fn with_fetcher(
        config: ChatListSyncerConfig,
        channel: Arc<dyn RealtimeChannel>,
        listener: Arc<dyn ChatListListener>,
        fetcher: Arc<dyn ChatListFetcher>,
    ) -> Self {
        info!(
            "[ChatSync] 创建会话列表同步器，用户ID: {}",
            config.user_id
        );
        Self {
            inner: Arc::new(SyncerInner {
                config,
                fetcher,
                channel,
                listener,
                state: Mutex::new(ChatListState::new()),
                generation: AtomicU64::new(0),
                subscription: Mutex::new(None),
                resync_task: Mutex::new(None),
                channel_error: AtomicBool::new(false),
            }),
        }
    }

    /// 启动同步：先全量拉取，再订阅增量变更
    ///
    /// 同一用户生命周期内最多一个逻辑订阅：已有订阅时先整体释放再重建
    pub async fn start(&self) -> Result<()> {
        if self.inner.subscription.lock().await.is_some() {
            warn!("[ChatSync] ⚠️ 已存在活跃订阅，先释放旧订阅");
            self.teardown().await;
        }

        info!(
            "[ChatSync] 🚀 启动会话列表同步，用户ID: {}",
            self.inner.config.user_id
        );

        // 初次全量拉取；失败已通知监听器，不阻止订阅建立
        let _ = self.inner.clone().refresh_once().await;

        let spec = ChannelSpec::chats_for_user(&self.inner.config.user_id);
        let bridge: Arc<dyn ChannelEvents> = Arc::new(ChannelBridge {
            inner: self.inner.clone(),
        });
        let handle = self.inner.channel.subscribe(spec, bridge).await?;
        *self.inner.subscription.lock().await = Some(handle);
        info!("[ChatSync] ✅ 实时订阅已建立");
        Ok(())
    }

    /// 全量拉取并整体替换本地列表
    ///
    /// 拉取失败不改动现有状态，只通知一次可恢复错误，不自动重试
    pub async fn refresh(&self) -> Result<()> {
        self.inner.clone().refresh_once().await
    }

    /// 当前会话列表快照
    pub async fn chats(&self) -> Vec<ChatSummary> {
        self.inner.state.lock().await.chats().to_vec()
    }

    /// 释放订阅、取消待执行的重拉、使在途拉取失效并清空本地列表
    ///
    /// 幂等；组件生命周期结束（会话切换、卸载、导航离开）的所有路径都应调用
    pub async fn teardown(&self) {
        // 在途拉取立即失效
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(task) = self.inner.resync_task.lock().await.take() {
            task.abort();
            debug!("[ChatSync] 已取消待执行的重拉任务");
        }

        let handle = self.inner.subscription.lock().await.take();
        if let Some(handle) = handle {
            info!("[ChatSync] 🧹 释放实时订阅");
            if let Err(e) = self.inner.channel.unsubscribe(handle).await {
                warn!("[ChatSync] ⚠️ 释放订阅失败: {}", e);
            }
        }

        self.inner.state.lock().await.clear();
        self.inner.channel_error.store(false, Ordering::SeqCst);
    }
}

impl SyncerInner {
    /// 执行一次全量拉取（带代数守护）
    async fn refresh_once(self: Arc<Self>) -> Result<()> {
        // 开始新一轮拉取：旧的在途拉取立刻失效
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "[ChatSync] 🔄 开始全量拉取会话列表 (generation={})",
            generation
        );

        match self.fetcher.fetch_chat_list(&self.config.user_id).await {
            Ok(chats) => {
                let snapshot = {
                    let mut state = self.state.lock().await;
                    // 拉取期间发生了 teardown 或新一轮拉取：丢弃迟到的结果
                    if self.generation.load(Ordering::SeqCst) != generation {
                        warn!(
                            "[ChatSync] ⚠️ 丢弃过期的拉取结果 (generation={})",
                            generation
                        );
                        return Ok(());
                    }
                    state.replace_all(chats);
                    state.chats().to_vec()
                };
                info!("[ChatSync] ✅ 全量拉取完成，会话数: {}", snapshot.len());
                self.listener.on_chat_list_changed(snapshot).await;
                Ok(())
            }
            Err(e) => {
                error!("[ChatSync] ❌ 拉取会话列表失败: {:#}", e);
                self.listener
                    .on_recoverable_error(format!("拉取会话列表失败: {}", e))
                    .await;
                Err(e)
            }
        }
    }

    /// 合并一条实时变更事件
    async fn handle_change(&self, change: RowChange) {
        let (applied, snapshot) = {
            let mut state = self.state.lock().await;
            let applied = state.apply(&change);
            let snapshot = if applied == Applied::Changed {
                Some(state.chats().to_vec())
            } else {
                None
            };
            (applied, snapshot)
        };

        match applied {
            Applied::Changed => {
                if let Some(snapshot) = snapshot {
                    self.listener.on_chat_list_changed(snapshot).await;
                }
            }
            // 静默忽略的事件已在合并层记录日志
            Applied::Ignored => {}
            Applied::Malformed => {
                self.listener
                    .on_recoverable_error("收到异常的实时事件载荷，已丢弃".to_string())
                    .await;
            }
        }
    }

    /// 处理通道状态变化
    async fn handle_status(self: Arc<Self>, status: ChannelStatus) {
        match status {
            ChannelStatus::Subscribed => {
                info!("[ChatSync] ✅ 实时订阅就绪");
                if self.channel_error.swap(false, Ordering::SeqCst) {
                    info!("[ChatSync] 通道异常标记已清除");
                }
            }
            ChannelStatus::Error => {
                error!(
                    "[ChatSync] ❌ 通道异常，{} 秒后重拉会话列表",
                    CHANNEL_ERROR_RESYNC_DELAY.as_secs()
                );
                self.channel_error.store(true, Ordering::SeqCst);
                self.schedule_resync().await;
            }
            ChannelStatus::TimedOut => {
                // 只记录，不重建订阅
                error!("[ChatSync] ⏰ 通道订阅超时");
            }
            ChannelStatus::Closed => {
                info!("[ChatSync] 🔒 通道已关闭");
            }
            ChannelStatus::Connecting => {
                debug!("[ChatSync] 通道连接中...");
            }
        }
    }

    /// 通道异常后安排一次延迟重拉（最多同时存在一个）
    ///
    /// 只重拉数据，不重建订阅：托管服务自行处理重连
    async fn schedule_resync(self: Arc<Self>) {
        let mut slot = self.resync_task.lock().await;
        if let Some(task) = slot.as_ref() {
            if !task.is_finished() {
                debug!("[ChatSync] 已有待执行的重拉任务，跳过");
                return;
            }
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let inner = self.clone();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(CHANNEL_ERROR_RESYNC_DELAY).await;
            // teardown（或手动刷新）已发生：放弃这次重拉
            if inner.generation.load(Ordering::SeqCst) != generation {
                debug!("[ChatSync] 重拉任务已过期，跳过");
                return;
            }
            info!("[ChatSync] 🔄 通道异常后的延迟重拉");
            // 失败已在 refresh_once 内部通知监听器
            let _ = inner.refresh_once().await;
        }));
    }
}

/// 把通道回调桥接到同步器内部状态
struct ChannelBridge {
    inner: Arc<SyncerInner>,
}

#[async_trait]
impl ChannelEvents for ChannelBridge {
    async fn on_change(&self, change: RowChange) {
        self.inner.handle_change(change).await;
    }

    async fn on_status(&self, status: ChannelStatus) {
        self.inner.clone().handle_status(status).await;
    }
}
