//! 消息模块
//!
//! 用户与后端（LLM）之间的消息收发，纯请求/响应，不走实时通道

pub mod api;
pub mod types;

// 重新导出主要类型和函数
pub use api::MessageApi;
pub use types::{Attachment, ContentAi, ContentUser, Message, MessageCreate};
