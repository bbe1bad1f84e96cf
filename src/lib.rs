pub mod etlas;

// 重新导出常用类型和函数，方便外部使用
pub use etlas::{
    chat::{ChatListListener, ChatListSyncer, ChatListSyncerConfig, ChatSummary},
    client::{ClientConfig, EtlasClient},
    realtime::{ChangeKind, ChannelStatus, RealtimeChannel, RowChange},
    session::{SessionProvider, StaticSession},
};
