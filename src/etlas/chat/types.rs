//! 会话数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会话摘要（会话列表的管理单元）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// 会话 ID（去重/合并键，更新过程中保持稳定）
    pub id: String,
    /// 会话标题；后端生成标题前为空，之后由 Update 事件补齐
    #[serde(default)]
    pub name_chat: Option<String>,
    /// 创建时间，仅用于排序，不参与身份判定
    pub created_at: DateTime<Utc>,
}

/// 创建会话请求（POST /chats/）
#[derive(Debug, Serialize)]
pub struct ChatCreate {
    /// 关联的 Scheme ID，可为空
    pub scheme_id: Option<String>,
    /// 用户 ID
    pub user_id: String,
}
