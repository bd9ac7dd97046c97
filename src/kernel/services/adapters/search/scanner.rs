//! 单文件匹配扫描
//!
//! - 已打开文件读快照（包含未保存的修改），不访问磁盘
//! - 磁盘文件：前 4KB 含 NUL 视为二进制，跳过；UTF-8 有损解码
//! - 每个匹配换算行列并截取所在整行

use super::position::PositionMapper;
use super::task::CancelToken;
use crate::kernel::services::ports::document::DocumentSnapshot;
use crate::kernel::services::ports::search::MatchRecord;
use memchr::memchr;
use regex::Regex;
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub const BINARY_PROBE_LEN: usize = 4096;

#[derive(Debug)]
pub enum FileContent<'a> {
    Text(Cow<'a, str>),
    Binary,
}

pub fn is_likely_binary(content: &[u8]) -> bool {
    let probe = &content[..content.len().min(BINARY_PROBE_LEN)];
    memchr(0, probe).is_some()
}

pub fn load_content<'a>(
    path: &Path,
    snapshot: &'a DocumentSnapshot,
) -> std::io::Result<FileContent<'a>> {
    if let Some(text) = snapshot.get(path) {
        return Ok(FileContent::Text(Cow::Borrowed(text.as_str())));
    }

    let mut file = File::open(path)?;
    let size = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let mut bytes = Vec::with_capacity(size.min(BINARY_PROBE_LEN));

    // 先只读前 4KB 判断是否为二进制，避免把大文件整个读入内存
    (&mut file)
        .take(BINARY_PROBE_LEN as u64)
        .read_to_end(&mut bytes)?;
    if is_likely_binary(&bytes) {
        return Ok(FileContent::Binary);
    }
    bytes.reserve(size.saturating_sub(bytes.len()));
    file.read_to_end(&mut bytes)?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok(FileContent::Text(Cow::Owned(text)))
}

pub fn group_names(regex: &Regex) -> Arc<[Option<String>]> {
    regex
        .capture_names()
        .map(|name| name.map(str::to_string))
        .collect()
}

pub fn scan_text(
    path: &Path,
    content: &str,
    regex: &Regex,
    cancel: &CancelToken,
) -> Vec<MatchRecord> {
    let names = group_names(regex);
    let mut mapper = PositionMapper::new(content);
    let mut matches = Vec::new();

    for caps in regex.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = whole.start();
        let pos = mapper.position(start);

        let line_start = mapper.line_start();
        let line_end = memchr(b'\n', &content.as_bytes()[start..])
            .map(|i| start + i)
            .unwrap_or(content.len());
        let line_text = content[line_start..line_end].trim_end_matches('\r');

        matches.push(MatchRecord {
            path: path.to_path_buf(),
            start,
            end: whole.end(),
            groups: caps
                .iter()
                .map(|g| g.map(|g| g.as_str().to_string()))
                .collect(),
            group_names: names.clone(),
            line: pos.line,
            col: pos.col,
            line_text: line_text.to_string(),
        });

        if cancel.is_cancelled() {
            break;
        }
    }

    matches
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/scanner.rs"]
mod tests;
