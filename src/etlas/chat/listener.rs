//! 会话列表监听器回调接口

use crate::etlas::chat::types::ChatSummary;
use async_trait::async_trait;

/// 会话列表监听器回调接口（对应原实现中侧边栏的列表状态与错误提示）
#[async_trait]
pub trait ChatListListener: Send + Sync {
    /// 会话列表发生变化（全量拉取或增量事件合并之后），携带完整的有序列表
    async fn on_chat_list_changed(&self, chats: Vec<ChatSummary>);

    /// 可恢复错误（拉取失败、事件载荷异常等），本地列表不受影响
    async fn on_recoverable_error(&self, message: String);
}

/// 空实现（默认监听器）
pub struct EmptyChatListListener;

#[async_trait]
impl ChatListListener for EmptyChatListListener {
    async fn on_chat_list_changed(&self, _chats: Vec<ChatSummary>) {}
    async fn on_recoverable_error(&self, _message: String) {}
}
