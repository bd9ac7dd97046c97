//! Editor-side contracts used by search/replace.
//!
//! The engine never owns editor buffers. It reads a frozen copy of their text when a search
//! starts and asks the owner to apply range edits when replacing in an open file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 搜索开始时的已打开文档快照（路径 -> 文本），之后只读
pub type DocumentSnapshot = BTreeMap<PathBuf, String>;

pub trait DocumentHandle {
    fn text(&self) -> String;

    /// 用 `text` 替换字节区间 `[start, end)`
    fn replace_range(&mut self, text: &str, start: usize, end: usize);
}

pub trait DocumentAccess {
    /// Current text of every open document that has a file path.
    fn open_documents(&self) -> DocumentSnapshot;

    fn find_document(&mut self, path: &Path) -> Option<&mut dyn DocumentHandle>;
}
