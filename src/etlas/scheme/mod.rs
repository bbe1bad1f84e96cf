//! Scheme 模块
//!
//! Scheme 是可复用的文本模板（通常是一段建表 SQL），会话创建时可以关联一个

pub mod api;
pub mod types;

// 重新导出主要类型和函数
pub use api::SchemeApi;
pub use types::{Scheme, SchemeCreate, SchemeUpdate};
