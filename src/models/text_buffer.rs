//! 文本缓冲区模型
//!
//! 职责：
//! - 文本存储（Rope）
//! - 字节偏移 ↔ 字符偏移映射
//! - 区间替换（供替换引擎直接修改已打开文档）

use crate::kernel::services::ports::DocumentHandle;
use ropey::{Rope, RopeSlice};
use std::borrow::Cow;
use std::io::{self, Write};

/// 从 RopeSlice 获取字符串，优先零拷贝
pub fn slice_to_cow(slice: RopeSlice<'_>) -> Cow<'_, str> {
    match slice.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(slice.to_string()),
    }
}

#[derive(Clone)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            version: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
        }
    }

    /// 每次修改递增
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 流式写入到 Writer，避免大文件 OOM
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.rope.chunks() {
            writer.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    pub fn line(&self, row: usize) -> Option<Cow<'_, str>> {
        (row < self.rope.len_lines()).then(|| slice_to_cow(self.rope.line(row)))
    }

    /// 字节偏移落在字符内部时向前取整到字符边界
    fn byte_to_char(&self, byte: usize) -> usize {
        let byte = byte.min(self.rope.len_bytes());
        self.rope.byte_to_char(byte)
    }

    /// 用 `text` 替换字节区间 `[start, end)`
    pub fn replace_bytes(&mut self, start: usize, end: usize, text: &str) {
        let start_char = self.byte_to_char(start);
        let end_char = self.byte_to_char(end.max(start));
        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
        if !text.is_empty() {
            self.rope.insert(start_char, text);
        }
        self.version += 1;
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentHandle for TextBuffer {
    fn text(&self) -> String {
        TextBuffer::text(self)
    }

    fn replace_range(&mut self, text: &str, start: usize, end: usize) {
        self.replace_bytes(start, end, text);
    }
}
