//! 消息类型定义
//!
//! 消息按 role 区分：用户消息携带纯文本内容，AI 回复按分析/注释/代码等
//! 分段返回，各段均可缺省

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 消息附件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// AI 回复内容（各字段均可缺省）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentAi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_executable_code: Option<String>,
}

/// 用户消息内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentUser {
    #[serde(default)]
    pub content: Option<String>,
}

/// 消息（role 为 "user" 或 "ai"）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "user")]
    User {
        id: String,
        content: ContentUser,
        created_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attachments: Option<Vec<Attachment>>,
    },
    #[serde(rename = "ai")]
    Ai {
        id: String,
        content: ContentAi,
        created_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attachments: Option<Vec<Attachment>>,
    },
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::User { id, .. } | Message::Ai { id, .. } => id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Message::User { created_at, .. } | Message::Ai { created_at, .. } => *created_at,
        }
    }
}

/// 发送消息请求（role 恒为 "user"）
#[derive(Debug, Serialize)]
pub struct MessageCreate {
    pub chat_id: String,
    pub role: String,
    pub content: ContentUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl MessageCreate {
    /// 构造一条发往指定会话的用户文本消息
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            role: "user".to_string(),
            content: ContentUser {
                content: Some(text.into()),
            },
            attachments: None,
        }
    }
}
