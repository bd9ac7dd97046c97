//! 替换协调器
//!
//! 已打开的文档在调用线程上直接通过 DocumentHandle 修改（编辑器缓冲区只能在其所属线程修改）；
//! 未打开的文件交给后台线程：读取、严格 UTF-8 解码、替换、写回。
//!
//! 每个文件内的匹配按 start 升序保存，替换时从后往前处理，前面的偏移不受影响。
//! 单个文件失败只报告错误，不影响其它文件。

use super::task::{next_task_id, BackgroundTask, CancelToken};
use crate::kernel::services::ports::document::{DocumentAccess, DocumentHandle};
use crate::kernel::services::ports::search::{
    MatchRecord, ReplaceBatch, ReplaceError, ReplaceMessage,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

/// 对 `content` 应用替换，返回新内容
///
/// `matches` must be sorted by ascending `start`. Every recorded range is checked against
/// `content` before anything is rewritten; on mismatch or overlap the byte offset of the
/// offending match is returned and `content` is left as is.
pub fn apply_replacements(
    content: &str,
    matches: &[MatchRecord],
    template: &str,
) -> std::result::Result<String, usize> {
    validate(content, matches)?;

    let mut out = content.to_string();
    for m in matches.iter().rev() {
        out.replace_range(m.start..m.end, &m.expand(template));
    }
    Ok(out)
}

fn validate(content: &str, matches: &[MatchRecord]) -> std::result::Result<(), usize> {
    let mut prev_end = 0usize;
    for (i, m) in matches.iter().enumerate() {
        if i > 0 && m.start < prev_end {
            return Err(m.start);
        }
        if content.get(m.start..m.end) != Some(m.matched_text()) {
            return Err(m.start);
        }
        prev_end = m.end;
    }
    Ok(())
}

fn replace_in_document(
    path: &Path,
    document: &mut dyn DocumentHandle,
    matches: &[MatchRecord],
    template: &str,
) -> std::result::Result<(), ReplaceError> {
    let text = document.text();
    validate(&text, matches).map_err(|offset| ReplaceError::Stale {
        path: path.to_path_buf(),
        offset,
    })?;

    for m in matches.iter().rev() {
        document.replace_range(&m.expand(template), m.start, m.end);
    }
    Ok(())
}

pub fn replace_in_file(
    path: &Path,
    matches: &[MatchRecord],
    template: &str,
) -> std::result::Result<(), ReplaceError> {
    let bytes = std::fs::read(path).map_err(|source| ReplaceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|source| ReplaceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let replaced =
        apply_replacements(&content, matches, template).map_err(|offset| ReplaceError::Stale {
            path: path.to_path_buf(),
            offset,
        })?;

    std::fs::write(path, replaced.as_bytes()).map_err(|source| ReplaceError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub struct ReplaceCoordinator {
    tx: Sender<ReplaceMessage>,
    task: Option<BackgroundTask>,
}

impl ReplaceCoordinator {
    pub fn new(tx: Sender<ReplaceMessage>) -> Self {
        Self { tx, task: None }
    }

    /// Apply `template` to every match of `batch`.
    ///
    /// Open documents are edited before this returns. Files on disk are rewritten by the
    /// worker; a single `ReplaceMessage::Finished` closes the run either way.
    pub fn replace(
        &mut self,
        batch: ReplaceBatch,
        template: &str,
        documents: &mut dyn DocumentAccess,
    ) -> std::io::Result<u64> {
        self.stop();

        let replace_id = next_task_id();
        let started = Instant::now();
        let template = template.to_string();
        let mut replacements = 0usize;
        let mut on_disk: Vec<(PathBuf, Vec<MatchRecord>)> = Vec::new();

        for (path, matches) in batch.into_files() {
            let Some(document) = documents.find_document(&path) else {
                on_disk.push((path, matches));
                continue;
            };

            match replace_in_document(&path, document, &matches, &template) {
                Ok(()) => {
                    replacements += matches.len();
                    tracing::debug!(replace_id, path = %path.display(), count = matches.len(), "replaced in open document");
                    let _ = self.tx.send(ReplaceMessage::Applied {
                        replace_id,
                        path,
                        matches,
                    });
                }
                Err(e) => {
                    tracing::warn!(replace_id, error = %e, "replace in open document failed");
                    let _ = self.tx.send(ReplaceMessage::Error {
                        replace_id,
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        let tx = self.tx.clone();
        let task = BackgroundTask::spawn("replace-worker", replace_id, move |cancel| {
            run_replace(
                replace_id,
                on_disk,
                &template,
                replacements,
                started,
                &cancel,
                &tx,
            );
        })?;
        self.task = Some(task);
        Ok(replace_id)
    }

    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.stop();
        }
    }

    /// 等待磁盘文件替换完成
    pub fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            task.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ReplaceCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_replace(
    replace_id: u64,
    files: Vec<(PathBuf, Vec<MatchRecord>)>,
    template: &str,
    mut replacements: usize,
    started: Instant,
    cancel: &CancelToken,
    tx: &Sender<ReplaceMessage>,
) {
    for (path, matches) in files {
        if cancel.is_cancelled() {
            break;
        }

        match replace_in_file(&path, &matches, template) {
            Ok(()) => {
                replacements += matches.len();
                tracing::debug!(replace_id, path = %path.display(), count = matches.len(), "replaced in file");
                let _ = tx.send(ReplaceMessage::Applied {
                    replace_id,
                    path,
                    matches,
                });
            }
            Err(e) => {
                tracing::warn!(replace_id, error = %e, "replace in file failed");
                let _ = tx.send(ReplaceMessage::Error {
                    replace_id,
                    path: e.path().to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    let cancelled = cancel.is_cancelled();
    let _ = tx.send(ReplaceMessage::Finished {
        replace_id,
        replacements,
        elapsed: started.elapsed(),
        cancelled,
    });
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/replace.rs"]
mod tests;
