//! 用户会话提供者
//!
//! 身份认证由外部服务负责（原实现为 next-auth + Google 登录），
//! 这里只消费"当前用户 ID"这一能力。没有用户会话时同步功能整体停用，不视为错误。

/// 用户会话提供者接口
pub trait SessionProvider: Send + Sync {
    /// 当前登录用户的 ID；未登录时返回 None
    fn current_user_id(&self) -> Option<String>;
}

/// 固定用户会话（CLI 和测试使用）
pub struct StaticSession {
    user_id: Option<String>,
}

impl StaticSession {
    /// 创建已登录的固定会话
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// 创建未登录会话
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
