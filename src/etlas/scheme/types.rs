//! Scheme 数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheme：保存的可复用文本模板
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheme {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 创建 Scheme 请求（POST /schemes/）
#[derive(Debug, Serialize)]
pub struct SchemeCreate {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub user_id: String,
}

/// 更新 Scheme 请求（PUT /schemes/）；只序列化实际变更的字段
#[derive(Debug, Default, Serialize)]
pub struct SchemeUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_skips_absent_fields() {
        let req = SchemeUpdate {
            id: "s1".to_string(),
            title: Some("新标题".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["id"], "s1");
        assert_eq!(json["title"], "新标题");
        assert!(json.get("content").is_none());
        assert!(json.get("attachment_url").is_none());
    }
}
