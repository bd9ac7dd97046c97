//! 字节偏移 -> (行, 列) 增量换算
//!
//! 匹配结果按偏移递增产生，缓存上一次的解析位置，每次只扫描两次查询之间的增量。

use crate::kernel::services::ports::search::TextPosition;
use memchr::{memchr_iter, memrchr};

pub struct PositionMapper<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
    line_start: usize,
    col: usize,
}

impl<'a> PositionMapper<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            offset: 0,
            line: 1,
            line_start: 0,
            col: 0,
        }
    }

    /// Resolve `offset` (clamped to the text length).
    ///
    /// Queries are expected in non-decreasing order. A query behind the cached cursor
    /// restarts from the beginning of the text instead of failing.
    pub fn position(&mut self, offset: usize) -> TextPosition {
        let offset = offset.min(self.bytes.len());
        if offset < self.offset {
            self.reset();
        }

        let delta = &self.bytes[self.offset..offset];
        let newlines = memchr_iter(b'\n', delta).count();
        if newlines > 0 {
            self.line += newlines;
            // memrchr 一定能找到，newlines > 0
            let last = memrchr(b'\n', delta).unwrap_or(0);
            self.line_start = self.offset + last + 1;
            self.col = count_chars(&self.bytes[self.line_start..offset]);
        } else {
            self.col += count_chars(delta);
        }
        self.offset = offset;

        TextPosition::new(self.line, self.col)
    }

    /// 当前行起始字节偏移（最近一次 `position` 的结果所在行）
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.line_start = 0;
        self.col = 0;
    }
}

/// 全量扫描版本，作为增量实现的参照
pub fn position_naive(text: &str, offset: usize) -> TextPosition {
    let bytes = &text.as_bytes()[..offset.min(text.len())];
    let line = memchr_iter(b'\n', bytes).count() + 1;
    let line_start = memrchr(b'\n', bytes).map(|i| i + 1).unwrap_or(0);
    TextPosition::new(line, count_chars(&bytes[line_start..]))
}

/// 统计 UTF-8 字符数：非续字节（0b10xxxxxx 以外）的个数
#[inline]
fn count_chars(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b as i8) >= -0x40).count()
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/position.rs"]
mod tests;
