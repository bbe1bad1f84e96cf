//! 会话列表状态（纯合并逻辑）
//!
//! 把 Insert/Update/Delete 事件合并进已拉取的快照。合并不依赖任何异步管道，
//! 可独立测试；异步部分（拉取、订阅、定时器）由 sync 模块包装。
//!
//! 不变量：列表始终按 created_at 降序排列，id 唯一，每次变更后重新保证。

use crate::etlas::chat::types::ChatSummary;
use crate::etlas::realtime::{ChangeKind, RowChange};
use tracing::{debug, warn};

/// 单条事件的合并结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// 列表发生了变化
    Changed,
    /// 事件被静默忽略（重复插入、未知 ID、未知事件类型等），只记录日志
    Ignored,
    /// 载荷异常（缺少 id 等必需字段），事件被丢弃，需要向上层提示
    Malformed,
}

/// 会话列表状态：按 created_at 降序、id 唯一
#[derive(Debug, Clone, Default)]
pub struct ChatListState {
    chats: Vec<ChatSummary>,
}

impl ChatListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前列表快照
    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// 清空列表（会话结束或组件卸载时）
    pub fn clear(&mut self) {
        self.chats.clear();
    }

    /// 用服务器快照整体替换本地列表
    ///
    /// 快照被视为权威数据：去重（同 id 保留先出现的一条）后按时间降序排列
    pub fn replace_all(&mut self, chats: Vec<ChatSummary>) {
        let mut deduped: Vec<ChatSummary> = Vec::with_capacity(chats.len());
        for chat in chats {
            if deduped.iter().any(|c| c.id == chat.id) {
                warn!("[ChatState] 快照中存在重复会话 ID，跳过: {}", chat.id);
                continue;
            }
            deduped.push(chat);
        }
        self.chats = deduped;
        self.sort_desc();
    }

    /// 合并一条行级变更事件
    pub fn apply(&mut self, change: &RowChange) -> Applied {
        match &change.kind {
            ChangeKind::Insert => self.apply_insert(change),
            ChangeKind::Update => self.apply_update(change),
            ChangeKind::Delete => self.apply_delete(change),
            ChangeKind::Other(kind) => {
                // 未知事件类型：记录后忽略，不视为致命错误
                warn!("[ChatState] ⚠️ 未知事件类型，忽略: {}", kind);
                Applied::Ignored
            }
        }
    }

    fn apply_insert(&mut self, change: &RowChange) -> Applied {
        let Some(row) = &change.new else {
            warn!("[ChatState] Insert 事件缺少 new 行，丢弃");
            return Applied::Malformed;
        };
        let Some(id) = &row.id else {
            warn!("[ChatState] Insert 事件缺少 id，丢弃");
            return Applied::Malformed;
        };
        let Some(created_at) = row.created_at else {
            warn!("[ChatState] Insert 事件缺少 created_at，丢弃: {}", id);
            return Applied::Malformed;
        };

        // 幂等：同 id 已存在时跳过（重复投递或与本地乐观插入竞争）
        if self.chats.iter().any(|c| c.id == *id) {
            debug!("[ChatState] 会话已存在，跳过插入: {}", id);
            return Applied::Ignored;
        }

        debug!("[ChatState] 插入新会话: {}", id);
        self.chats.insert(
            0,
            ChatSummary {
                id: id.clone(),
                name_chat: row.name_chat.clone(),
                created_at,
            },
        );
        self.sort_desc();
        Applied::Changed
    }

    fn apply_update(&mut self, change: &RowChange) -> Applied {
        let Some(row) = &change.new else {
            warn!("[ChatState] Update 事件缺少 new 行，丢弃");
            return Applied::Malformed;
        };
        let Some(id) = &row.id else {
            warn!("[ChatState] Update 事件缺少 id，丢弃");
            return Applied::Malformed;
        };

        let Some(chat) = self.chats.iter_mut().find(|c| c.id == *id) else {
            // 本地尚未见过该会话：不物化，后续的刷新或 Insert 会补齐
            debug!("[ChatState] Update 对应的会话不存在，跳过: {}", id);
            return Applied::Ignored;
        };

        // 只合并事件中出现的字段，未出现的字段保留原值
        let before = chat.clone();
        if let Some(name) = &row.name_chat {
            chat.name_chat = Some(name.clone());
        }
        if let Some(created_at) = row.created_at {
            chat.created_at = created_at;
        }

        if *chat == before {
            debug!("[ChatState] 会话无实际变化: {}", id);
            return Applied::Ignored;
        }

        debug!("[ChatState] 更新会话: {}", id);
        self.sort_desc();
        Applied::Changed
    }

    fn apply_delete(&mut self, change: &RowChange) -> Applied {
        // Delete 事件的 id 在 old 行中；个别实现放在 new 中，做兼容
        let id = change
            .old
            .as_ref()
            .and_then(|row| row.id.clone())
            .or_else(|| change.new.as_ref().and_then(|row| row.id.clone()));
        let Some(id) = id else {
            warn!("[ChatState] Delete 事件缺少 id，丢弃");
            return Applied::Malformed;
        };

        let before = self.chats.len();
        self.chats.retain(|c| c.id != id);
        if self.chats.len() == before {
            debug!("[ChatState] Delete 对应的会话不存在，跳过: {}", id);
            return Applied::Ignored;
        }

        debug!("[ChatState] 删除会话: {}", id);
        // 删除不影响剩余条目的相对顺序，无需重排
        Applied::Changed
    }

    /// 按 created_at 降序排列
    ///
    /// 稳定排序：时间相同的条目保持相对顺序，无变化的刷新不会造成界面抖动
    fn sort_desc(&mut self) {
        self.chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etlas::realtime::ChatRow;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn summary(id: &str, name: Option<&str>, secs: i64) -> ChatSummary {
        ChatSummary {
            id: id.to_string(),
            name_chat: name.map(|s| s.to_string()),
            created_at: ts(secs),
        }
    }

    fn row(id: Option<&str>, name: Option<&str>, secs: Option<i64>) -> ChatRow {
        ChatRow {
            id: id.map(|s| s.to_string()),
            name_chat: name.map(|s| s.to_string()),
            created_at: secs.map(ts),
        }
    }

    fn insert(id: &str, secs: i64) -> RowChange {
        RowChange {
            kind: ChangeKind::Insert,
            new: Some(row(Some(id), None, Some(secs))),
            old: None,
        }
    }

    fn update(id: &str, name: Option<&str>, secs: Option<i64>) -> RowChange {
        RowChange {
            kind: ChangeKind::Update,
            new: Some(row(Some(id), name, secs)),
            old: None,
        }
    }

    fn delete(id: &str) -> RowChange {
        RowChange {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(row(Some(id), None, None)),
        }
    }

    /// 断言不变量：id 唯一且按 created_at 降序
    fn assert_invariants(state: &ChatListState) {
        let chats = state.chats();
        for (i, chat) in chats.iter().enumerate() {
            for other in &chats[i + 1..] {
                assert_ne!(chat.id, other.id, "存在重复 id: {}", chat.id);
                assert!(
                    chat.created_at >= other.created_at,
                    "列表未按时间降序排列"
                );
            }
        }
    }

    #[test]
    fn test_insert_orders_descending() {
        // 场景：空列表，Insert a(T1)，Insert b(T2>T1) → [b, a]
        let mut state = ChatListState::new();
        assert_eq!(state.apply(&insert("a", 100)), Applied::Changed);
        assert_eq!(state.apply(&insert("b", 200)), Applied::Changed);

        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        assert_eq!(state.apply(&insert("a", 100)), Applied::Ignored);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_keeps_first_payload() {
        // 同 id 两次快速插入且载荷不同：保留第一条，第二条按重复丢弃
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));

        let second = RowChange {
            kind: ChangeKind::Insert,
            new: Some(row(Some("a"), Some("晚到的标题"), Some(999))),
            old: None,
        };
        assert_eq!(state.apply(&second), Applied::Ignored);
        assert_eq!(state.chats()[0].name_chat, None);
        assert_eq!(state.chats()[0].created_at, ts(100));
    }

    #[test]
    fn test_update_merges_present_fields_only() {
        // 场景：[b, a]，Update a 设置标题 → created_at 不变
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        state.apply(&insert("b", 200));

        assert_eq!(
            state.apply(&update("a", Some("Foo"), None)),
            Applied::Changed
        );

        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        let a = &state.chats()[1];
        assert_eq!(a.name_chat.as_deref(), Some("Foo"));
        assert_eq!(a.created_at, ts(100));
        assert_invariants(&state);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        assert_eq!(
            state.apply(&update("missing", Some("X"), None)),
            Applied::Ignored
        );
        assert_eq!(state.len(), 1);
        assert_eq!(state.chats()[0].name_chat, None);
    }

    #[test]
    fn test_update_created_at_resorts() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        state.apply(&insert("b", 200));

        // a 的时间被改到最新，应当排到最前
        assert_eq!(state.apply(&update("a", None, Some(300))), Applied::Changed);
        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_delete_removes_and_preserves_order() {
        // 场景：[b, a]，Delete b → [a]
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        state.apply(&insert("b", 200));
        state.apply(&insert("c", 300));

        assert_eq!(state.apply(&delete("b")), Applied::Changed);
        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_invariants(&state);
    }

    #[test]
    fn test_delete_absent_id_is_noop() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        assert_eq!(state.apply(&delete("missing")), Applied::Ignored);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));

        let no_id = RowChange {
            kind: ChangeKind::Insert,
            new: Some(row(None, Some("无 ID"), Some(200))),
            old: None,
        };
        assert_eq!(state.apply(&no_id), Applied::Malformed);
        assert_eq!(state.len(), 1);

        let no_id_update = RowChange {
            kind: ChangeKind::Update,
            new: Some(row(None, Some("无 ID"), None)),
            old: None,
        };
        assert_eq!(state.apply(&no_id_update), Applied::Malformed);

        let no_id_delete = RowChange {
            kind: ChangeKind::Delete,
            new: None,
            old: Some(row(None, None, None)),
        };
        assert_eq!(state.apply(&no_id_delete), Applied::Malformed);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_unknown_event_kind_is_ignored() {
        let mut state = ChatListState::new();
        state.apply(&insert("a", 100));
        let other = RowChange {
            kind: ChangeKind::Other("TRUNCATE".to_string()),
            new: None,
            old: None,
        };
        assert_eq!(state.apply(&other), Applied::Ignored);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_replace_all_sorts_and_dedups() {
        let mut state = ChatListState::new();
        state.replace_all(vec![
            summary("a", None, 100),
            summary("b", Some("B"), 300),
            summary("a", Some("重复"), 999),
            summary("c", None, 200),
        ]);

        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        // 重复 id 保留先出现的一条
        assert_eq!(state.chats()[2].name_chat, None);
        assert_invariants(&state);
    }

    #[test]
    fn test_replace_all_is_stable_for_equal_timestamps() {
        // 时间相同的条目顺序稳定：重复应用同一快照结果一致
        let snapshot = vec![
            summary("x", None, 100),
            summary("y", None, 100),
            summary("z", None, 100),
        ];
        let mut state = ChatListState::new();
        state.replace_all(snapshot.clone());
        let first: Vec<String> = state.chats().iter().map(|c| c.id.clone()).collect();
        state.replace_all(snapshot);
        let second: Vec<String> = state.chats().iter().map(|c| c.id.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_event_sequence_keeps_invariants() {
        // 任意事件序列之后：id 唯一且按时间降序
        let mut state = ChatListState::new();
        let events = vec![
            insert("a", 100),
            insert("b", 300),
            insert("a", 150),
            update("b", Some("B"), None),
            insert("c", 200),
            delete("a"),
            update("c", None, Some(400)),
            delete("missing"),
            insert("d", 250),
        ];
        for event in &events {
            state.apply(event);
        }
        assert_invariants(&state);
        let ids: Vec<&str> = state.chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "d"]);
    }
}
