//! 搜索替换服务模块
//!
//! - PositionMapper: 偏移 -> 行列的增量换算
//! - enumerate_files: 目录 / 已打开文档的文件列表
//! - scan_text: 单文件正则扫描
//! - SearchCoordinator: 后台多文件搜索，批量上报结果
//! - expand: 替换模板展开（反向引用）
//! - ReplaceCoordinator: 已打开文档与磁盘文件的替换

mod enumerator;
mod filter;
mod global;
mod position;
mod replace;
mod scanner;
mod substitute;
mod task;

pub use enumerator::{enumerate_files, SearchScope};
pub use filter::{FileFilter, FileMask};
pub use global::{
    compile_pattern, SearchCoordinator, SearchOptions, SearchRequest, RESULTS_EMIT_INTERVAL,
};
pub use position::{position_naive, PositionMapper};
pub use replace::{apply_replacements, replace_in_file, ReplaceCoordinator};
pub use scanner::{group_names, is_likely_binary, load_content, scan_text, FileContent};
pub use substitute::expand;
pub use task::CancelToken;
