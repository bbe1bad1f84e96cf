pub mod chat;
pub mod client;
pub mod message;
pub mod realtime;
pub mod scheme;
pub mod session;
pub mod types;

// 重新导出会话列表同步相关类型和函数
pub use chat::{ChatListSyncer, ChatListSyncerConfig, ChatSummary};
pub use client::{ClientConfig, EtlasClient};
pub use session::{SessionProvider, StaticSession};
