//! 会话模块
//!
//! 维护用户会话列表的本地视图：全量拉取 + 实时增量事件合并

pub mod api;
pub mod listener;
pub mod state;
pub mod sync;
pub mod types;

// 重新导出主要类型和函数
pub use api::{ChatApi, ChatListFetcher};
pub use listener::{ChatListListener, EmptyChatListListener};
pub use state::{Applied, ChatListState};
pub use sync::{ChatListSyncer, ChatListSyncerConfig};
pub use types::{ChatCreate, ChatSummary};
