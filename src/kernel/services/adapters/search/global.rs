//! 全局搜索协调器
//!
//! - 单个后台线程：先列出文件，再逐个扫描
//! - 新的搜索会先同步停止正在进行的搜索
//! - 结果按 1 秒间隔批量发送，运行结束（包括取消）时发送剩余结果

use super::enumerator::{enumerate_files, SearchScope};
use super::filter::FileMask;
use super::scanner::{load_content, scan_text, FileContent};
use super::task::{next_task_id, BackgroundTask, CancelToken};
use crate::kernel::services::ports::document::{DocumentAccess, DocumentSnapshot};
use crate::kernel::services::ports::search::{
    ExclusionFilter, FileResults, NoExclusion, Result, SearchMessage, SearchState,
};
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const RESULTS_EMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Find-dialog flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

pub fn compile_pattern(query: &str, options: SearchOptions) -> Result<Regex> {
    let mut pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    if options.whole_word {
        pattern = format!(r"\b(?:{})\b", pattern);
    }

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .crlf(true)
        .build()?)
}

/// Everything a single run needs. Moved into the worker when the run starts.
pub struct SearchRequest {
    pub regex: Regex,
    pub mask: Option<FileMask>,
    pub scope: SearchScope,
    pub filter: Arc<dyn ExclusionFilter>,
}

impl SearchRequest {
    pub fn new(regex: Regex, scope: SearchScope) -> Self {
        Self {
            regex,
            mask: None,
            scope,
            filter: Arc::new(NoExclusion),
        }
    }

    pub fn with_mask(mut self, mask: Option<FileMask>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn ExclusionFilter>) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(0)))
    }

    fn set(&self, state: SearchState) {
        let v = match state {
            SearchState::Idle => 0,
            SearchState::Enumerating => 1,
            SearchState::Scanning => 2,
            SearchState::Completed => 3,
            SearchState::Cancelled => 4,
        };
        self.0.store(v, Ordering::Release);
    }

    fn get(&self) -> SearchState {
        match self.0.load(Ordering::Acquire) {
            1 => SearchState::Enumerating,
            2 => SearchState::Scanning,
            3 => SearchState::Completed,
            4 => SearchState::Cancelled,
            _ => SearchState::Idle,
        }
    }
}

pub struct SearchCoordinator {
    tx: Sender<SearchMessage>,
    state: SharedState,
    emit_interval: Duration,
    task: Option<BackgroundTask>,
}

impl SearchCoordinator {
    pub fn new(tx: Sender<SearchMessage>) -> Self {
        Self {
            tx,
            state: SharedState::new(),
            emit_interval: RESULTS_EMIT_INTERVAL,
            task: None,
        }
    }

    /// 结果批量发送的最小间隔，默认 `RESULTS_EMIT_INTERVAL`
    pub fn with_emit_interval(mut self, interval: Duration) -> Self {
        self.emit_interval = interval;
        self
    }

    /// Start a new run and return its id.
    ///
    /// Any previous run is stopped and joined first; its messages that are already queued
    /// still carry the old id.
    pub fn search(
        &mut self,
        request: SearchRequest,
        documents: &dyn DocumentAccess,
    ) -> std::io::Result<u64> {
        self.stop();

        let snapshot = Arc::new(documents.open_documents());
        let search_id = next_task_id();
        let tx = self.tx.clone();
        let state = self.state.clone();
        let emit_interval = self.emit_interval;
        state.set(SearchState::Enumerating);

        tracing::debug!(
            search_id,
            scope = ?request.scope,
            pattern = request.regex.as_str(),
            open_documents = snapshot.len(),
            "search started"
        );

        let spawned = BackgroundTask::spawn("search-worker", search_id, move |cancel| {
            let run = SearchRun {
                search_id,
                request: &request,
                snapshot: &snapshot,
                cancel: &cancel,
                state: &state,
                tx: &tx,
                emit_interval,
            };
            run.run();
        });
        match spawned {
            Ok(task) => {
                self.task = Some(task);
                Ok(search_id)
            }
            Err(e) => {
                self.state.set(SearchState::Idle);
                Err(e)
            }
        }
    }

    /// 同步停止当前搜索
    pub fn stop(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.stop();
            tracing::debug!(search_id = task.id(), "search stopped");
        }
    }

    /// 等待当前搜索自然结束
    pub fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            task.join();
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn current_search_id(&self) -> Option<u64> {
        self.task.as_ref().map(BackgroundTask::id)
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 一次搜索在工作线程上的上下文
struct SearchRun<'a> {
    search_id: u64,
    request: &'a SearchRequest,
    snapshot: &'a DocumentSnapshot,
    cancel: &'a CancelToken,
    state: &'a SharedState,
    tx: &'a Sender<SearchMessage>,
    emit_interval: Duration,
}

impl SearchRun<'_> {
    fn run(&self) {
        self.send(SearchMessage::Progress {
            search_id: self.search_id,
            current: None,
            total: 0,
        });

        let files = enumerate_files(
            &self.request.scope,
            self.snapshot,
            self.request.mask.as_ref(),
            self.request.filter.as_ref(),
            self.cancel,
        );

        if self.cancel.is_cancelled() {
            self.finish(SearchState::Cancelled, 0, 0);
            return;
        }

        self.scan_files(&files);
    }

    /// 逐个扫描已列出的文件；文件在列出之后消失或无法读取时只报告错误
    fn scan_files(&self, files: &[PathBuf]) {
        let search_id = self.search_id;
        let started = Instant::now();
        let total = files.len();
        self.state.set(SearchState::Scanning);
        self.send(SearchMessage::Progress {
            search_id,
            current: Some(0),
            total,
        });

        let root = self.request.scope.root().map(|r| r.to_path_buf());
        let mut pending: Vec<FileResults> = Vec::new();
        let mut last_emit = Instant::now();
        let mut files_searched = 0usize;
        let mut total_matches = 0usize;

        for (index, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            let matches = match load_content(path, self.snapshot) {
                Ok(FileContent::Text(content)) => {
                    scan_text(path, &content, &self.request.regex, self.cancel)
                }
                Ok(FileContent::Binary) => {
                    tracing::debug!(search_id, path = %path.display(), "skip binary file");
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(search_id, path = %path.display(), error = %e, "read failed");
                    self.send(SearchMessage::Error {
                        search_id,
                        path: Some(path.clone()),
                        message: format!("Error opening file {}: {}", path.display(), e),
                    });
                    Vec::new()
                }
            };
            files_searched += 1;

            if !matches.is_empty() {
                total_matches += matches.len();
                pending.push(FileResults {
                    root: root.clone(),
                    path: path.clone(),
                    matches,
                });
            }

            if last_emit.elapsed() >= self.emit_interval {
                self.send(SearchMessage::Progress {
                    search_id,
                    current: Some(index + 1),
                    total,
                });
                if !pending.is_empty() {
                    self.send(SearchMessage::Results {
                        search_id,
                        results: std::mem::take(&mut pending),
                    });
                }
                last_emit = Instant::now();
            }
        }

        let final_state = if self.cancel.is_cancelled() {
            SearchState::Cancelled
        } else {
            SearchState::Completed
        };

        self.send(SearchMessage::Progress {
            search_id,
            current: Some(files_searched),
            total,
        });
        if !pending.is_empty() {
            self.send(SearchMessage::Results {
                search_id,
                results: pending,
            });
        }

        tracing::debug!(
            search_id,
            files_searched,
            total_matches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            state = ?final_state,
            "search finished"
        );
        self.finish(final_state, files_searched, total_matches);
    }

    fn finish(&self, final_state: SearchState, files_searched: usize, total_matches: usize) {
        self.state.set(final_state);
        self.send(SearchMessage::Finished {
            search_id: self.search_id,
            state: final_state,
            files_searched,
            total_matches,
        });
    }

    fn send(&self, msg: SearchMessage) {
        let _ = self.tx.send(msg);
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/global.rs"]
mod tests;
