//! enki-search - 多文件搜索替换引擎
//!
//! 模块结构：
//! - kernel::services::ports: 数据契约（MatchRecord, SearchMessage, DocumentAccess ...）
//! - kernel::services::adapters: 后台搜索 / 替换实现、配置与目录
//! - kernel::search: 搜索结果模型（勾选、构造替换批次）
//! - models: 已打开文档（TextBuffer, OpenDocuments）

pub mod kernel;
pub mod models;
