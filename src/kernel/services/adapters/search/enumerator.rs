//! 待搜索文件列表
//!
//! - 已打开文档：快照中的路径，按 basename 过滤掩码
//! - 目录：递归遍历，跳过以 `.` 开头的目录和文件，应用掩码与全局排除规则
//!
//! 结果总是按路径排序，保证进度计数和结果顺序可复现。

use super::filter::FileMask;
use super::task::CancelToken;
use crate::kernel::services::ports::document::DocumentSnapshot;
use crate::kernel::services::ports::search::ExclusionFilter;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    OpenDocuments,
    Directory(PathBuf),
}

impl SearchScope {
    pub fn root(&self) -> Option<&Path> {
        match self {
            SearchScope::OpenDocuments => None,
            SearchScope::Directory(root) => Some(root),
        }
    }
}

pub fn enumerate_files(
    scope: &SearchScope,
    snapshot: &DocumentSnapshot,
    mask: Option<&FileMask>,
    filter: &dyn ExclusionFilter,
    cancel: &CancelToken,
) -> Vec<PathBuf> {
    let mut files = match scope {
        SearchScope::OpenDocuments => snapshot
            .keys()
            .filter(|path| mask.is_none_or(|m| m.matches(&file_name(path))))
            .cloned()
            .collect(),
        SearchScope::Directory(root) => walk_dir(root, mask, filter, cancel),
    };
    files.sort();
    files
}

fn walk_dir(
    root: &Path,
    mask: Option<&FileMask>,
    filter: &dyn ExclusionFilter,
    cancel: &CancelToken,
) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.depth() == 0 || !is_dot_name(entry.file_name()))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "skip entry");
                continue;
            }
        };

        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if is_dir {
            if cancel.is_cancelled() {
                tracing::debug!(root = %root.display(), collected = files.len(), "walk cancelled");
                break;
            }
            continue;
        }

        let path = entry.path();
        // 符号链接跟随到目标判断是否为普通文件
        if !path.is_file() {
            continue;
        }

        let name = file_name(path);
        if mask.is_some_and(|m| !m.matches(&name)) {
            continue;
        }
        if filter.matches(&name) {
            continue;
        }

        files.push(path.to_path_buf());
    }
    files
}

fn is_dot_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/enumerator.rs"]
mod tests;
