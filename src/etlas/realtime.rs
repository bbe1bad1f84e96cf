//! 实时变更通道抽象
//!
//! chats 表的行级变更由外部托管的实时服务推送（原实现为 Supabase Realtime）。
//! 本模块只定义 subscribe/unsubscribe + 类型化事件的窄接口，
//! 合并逻辑不依赖具体传输实现，测试中注入脚本化的假通道即可。

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// 行级变更事件类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// 未知事件类型（保留原始标识，只记录日志，不视为致命错误）
    Other(String),
}

impl ChangeKind {
    /// 从服务端的事件标识解析（INSERT / UPDATE / DELETE）
    pub fn parse(raw: &str) -> ChangeKind {
        match raw {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            other => ChangeKind::Other(other.to_string()),
        }
    }
}

/// 通道生命周期状态
///
/// 只用于决定是否需要延迟重拉全量列表，不对外层 UI 暴露
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Subscribed,
    Error,
    TimedOut,
    Closed,
}

/// chats 表一行的字段
///
/// 服务端推送的行字段使用小写命名（namechat / createdat），
/// 通过 serde alias 统一映射到客户端模型的命名
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "namechat")]
    pub name_chat: Option<String>,
    #[serde(default, alias = "createdat")]
    pub created_at: Option<DateTime<Utc>>,
}

/// 行级变更事件载荷（对应 { event_type, new?, old? }）
#[derive(Debug, Clone)]
pub struct RowChange {
    pub kind: ChangeKind,
    /// 变更后的行（Insert / Update 事件携带）
    pub new: Option<ChatRow>,
    /// 变更前的行（Delete 事件携带）
    pub old: Option<ChatRow>,
}

impl RowChange {
    /// 从服务端推送的原始 JSON 载荷解析
    pub fn from_payload(payload: &serde_json::Value) -> Result<RowChange> {
        let kind_raw = payload
            .get("event_type")
            .or_else(|| payload.get("eventType"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("载荷中缺少 event_type 字段"))?;

        let new = match payload.get("new") {
            Some(v) if !v.is_null() => Some(serde_json::from_value(v.clone())?),
            _ => None,
        };
        let old = match payload.get("old") {
            Some(v) if !v.is_null() => Some(serde_json::from_value(v.clone())?),
            _ => None,
        };

        Ok(RowChange {
            kind: ChangeKind::parse(kind_raw),
            new,
            old,
        })
    }
}

/// 订阅范围：表名 + 行过滤条件
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub table: String,
    pub filter: String,
}

impl ChannelSpec {
    /// 订阅某个用户的 chats 表变更
    ///
    /// 过滤条件使用服务端列名（userid，与 namechat / createdat 一致的小写命名）
    pub fn chats_for_user(user_id: &str) -> Self {
        Self {
            table: "chats".to_string(),
            filter: format!("userid=eq.{}", user_id),
        }
    }
}

/// 订阅句柄：用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

/// 通道事件接收端（由订阅方实现）
#[async_trait]
pub trait ChannelEvents: Send + Sync {
    /// 行级变更事件
    async fn on_change(&self, change: RowChange);

    /// 通道状态变化
    async fn on_status(&self, status: ChannelStatus);
}

/// 实时通道提供者接口
///
/// 提供者实例由调用方显式构造并传入，生命周期随订阅方管理，
/// 避免模块级单例带来的跨组件共享状态
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// 订阅一个表/过滤条件的行级变更，事件和状态通过 sink 回调
    async fn subscribe(
        &self,
        spec: ChannelSpec,
        sink: Arc<dyn ChannelEvents>,
    ) -> Result<ChannelHandle>;

    /// 释放订阅；对同一句柄重复调用应当是幂等的
    async fn unsubscribe(&self, handle: ChannelHandle) -> Result<()>;
}

/// 空通道实现：接受订阅但从不推送事件（离线演示场景，列表只靠全量拉取）
pub struct NullRealtimeChannel;

#[async_trait]
impl RealtimeChannel for NullRealtimeChannel {
    async fn subscribe(
        &self,
        spec: ChannelSpec,
        sink: Arc<dyn ChannelEvents>,
    ) -> Result<ChannelHandle> {
        warn!(
            "[Realtime] ⚠️ 使用空通道实现，表 {} (filter={}) 不会收到实时事件",
            spec.table, spec.filter
        );
        sink.on_status(ChannelStatus::Subscribed).await;
        Ok(ChannelHandle(0))
    }

    async fn unsubscribe(&self, _handle: ChannelHandle) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_insert_payload() {
        let payload = json!({
            "event_type": "INSERT",
            "new": { "id": "c1", "namechat": "标题", "createdat": "2024-05-01T10:00:00Z" }
        });
        let change = RowChange::from_payload(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Insert);
        let row = change.new.unwrap();
        assert_eq!(row.id.as_deref(), Some("c1"));
        assert_eq!(row.name_chat.as_deref(), Some("标题"));
        assert!(row.created_at.is_some());
        assert!(change.old.is_none());
    }

    #[test]
    fn test_parse_tolerates_client_side_naming() {
        // 客户端命名（name_chat / created_at）同样可以解析
        let payload = json!({
            "event_type": "UPDATE",
            "new": { "id": "c1", "name_chat": "新标题", "created_at": "2024-05-01T10:00:00Z" }
        });
        let change = RowChange::from_payload(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.new.unwrap().name_chat.as_deref(), Some("新标题"));
    }

    #[test]
    fn test_parse_delete_payload() {
        let payload = json!({
            "event_type": "DELETE",
            "old": { "id": "c9" }
        });
        let change = RowChange::from_payload(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert_eq!(change.old.unwrap().id.as_deref(), Some("c9"));
    }

    #[test]
    fn test_parse_unknown_event_kind() {
        let payload = json!({ "event_type": "TRUNCATE" });
        let change = RowChange::from_payload(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Other("TRUNCATE".to_string()));
    }

    #[test]
    fn test_parse_missing_event_type() {
        let payload = json!({ "new": { "id": "c1" } });
        assert!(RowChange::from_payload(&payload).is_err());
    }

    #[test]
    fn test_parse_row_without_id() {
        // 缺少 id 的行可以解析出来，由合并层判定为异常载荷
        let payload = json!({
            "event_type": "INSERT",
            "new": { "namechat": "无 ID" }
        });
        let change = RowChange::from_payload(&payload).unwrap();
        assert!(change.new.unwrap().id.is_none());
    }
}
