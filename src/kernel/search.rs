//! Search results model.
//!
//! Consumer side of the search/replace channels: collects batched results of the active
//! run, tracks which matches are checked for replacement and drops messages that belong to
//! an older run.

use crate::kernel::services::ports::{
    FileResults, MatchRecord, ReplaceBatch, ReplaceMessage, SearchMessage, SearchState,
};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SearchFileResult {
    pub results: FileResults,
    /// 与 `results.matches` 一一对应
    pub checked: Vec<bool>,
}

impl SearchFileResult {
    fn new(results: FileResults) -> Self {
        let checked = vec![true; results.matches.len()];
        Self { results, checked }
    }

    pub fn path(&self) -> &Path {
        &self.results.path
    }

    pub fn checked_matches(&self) -> impl Iterator<Item = &MatchRecord> {
        self.results
            .matches
            .iter()
            .zip(&self.checked)
            .filter_map(|(m, &checked)| checked.then_some(m))
    }
}

#[derive(Debug, Clone)]
pub struct SearchResultsModel {
    pub active_search_id: Option<u64>,
    pub active_replace_id: Option<u64>,
    pub state: SearchState,
    /// `None` 表示仍在统计文件数量
    pub progress: Option<(usize, usize)>,
    pub files: Vec<SearchFileResult>,
    pub total_matches: usize,
    pub errors: Vec<String>,
    pub status: Option<String>,
}

impl Default for SearchResultsModel {
    fn default() -> Self {
        Self {
            active_search_id: None,
            active_replace_id: None,
            state: SearchState::Idle,
            progress: None,
            files: Vec::new(),
            total_matches: 0,
            errors: Vec::new(),
            status: None,
        }
    }
}

impl SearchResultsModel {
    /// 开始新的搜索：清空旧结果，只接受 `search_id` 的消息
    pub fn begin_search(&mut self, search_id: u64) {
        self.active_search_id = Some(search_id);
        self.state = SearchState::Enumerating;
        self.progress = None;
        self.files.clear();
        self.total_matches = 0;
        self.errors.clear();
        self.status = None;
    }

    pub fn apply_message(&mut self, msg: SearchMessage) -> bool {
        if self.active_search_id != Some(msg.search_id()) {
            return false;
        }

        match msg {
            SearchMessage::Progress { current, total, .. } => {
                let progress = current.map(|c| (c, total));
                let changed = self.progress != progress;
                self.progress = progress;
                if current.is_some() && self.state == SearchState::Enumerating {
                    self.state = SearchState::Scanning;
                }
                changed
            }
            SearchMessage::Results { results, .. } => {
                for file in results {
                    self.total_matches += file.matches.len();
                    self.files.push(SearchFileResult::new(file));
                }
                true
            }
            SearchMessage::Error { message, .. } => {
                self.errors.push(message);
                true
            }
            SearchMessage::Finished {
                state,
                files_searched,
                total_matches,
                ..
            } => {
                self.state = state;
                self.status = Some(format!(
                    "{} matches in {} files searched",
                    total_matches, files_searched
                ));
                true
            }
        }
    }

    pub fn is_searching(&self) -> bool {
        self.state.is_running()
    }

    pub fn file(&self, path: &Path) -> Option<&SearchFileResult> {
        self.files.iter().find(|f| f.path() == path)
    }

    pub fn set_match_checked(&mut self, file_index: usize, match_index: usize, checked: bool) -> bool {
        let Some(slot) = self
            .files
            .get_mut(file_index)
            .and_then(|f| f.checked.get_mut(match_index))
        else {
            return false;
        };
        let changed = *slot != checked;
        *slot = checked;
        changed
    }

    pub fn set_file_checked(&mut self, file_index: usize, checked: bool) -> bool {
        let Some(file) = self.files.get_mut(file_index) else {
            return false;
        };
        let changed = file.checked.iter().any(|&c| c != checked);
        file.checked.iter_mut().for_each(|c| *c = checked);
        changed
    }

    pub fn checked_count(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.checked.iter().filter(|&&c| c).count())
            .sum()
    }

    /// 由勾选的匹配构造替换批次
    pub fn replace_batch(&self) -> ReplaceBatch {
        ReplaceBatch::from_records(
            self.files
                .iter()
                .flat_map(SearchFileResult::checked_matches)
                .cloned(),
        )
    }

    /// 开始替换：之后只接受 `replace_id` 的消息
    pub fn begin_replace(&mut self, replace_id: u64) {
        self.active_replace_id = Some(replace_id);
    }

    /// 已替换的匹配从结果中移除；文件没有剩余匹配时整个移除
    pub fn apply_replace_message(&mut self, msg: ReplaceMessage) -> bool {
        if self.active_replace_id != Some(msg.replace_id()) {
            return false;
        }

        if let Some(summary) = msg.summary() {
            self.status = Some(summary);
            return true;
        }

        match msg {
            ReplaceMessage::Applied { path, matches, .. } => self.remove_matches(&path, &matches),
            ReplaceMessage::Error { message, .. } => {
                self.errors.push(message);
                true
            }
            ReplaceMessage::Finished { .. } => false,
        }
    }

    fn remove_matches(&mut self, path: &Path, applied: &[MatchRecord]) -> bool {
        let Some(index) = self.files.iter().position(|f| f.path() == path) else {
            return false;
        };

        let file = &mut self.files[index];
        let before = file.results.matches.len();
        let mut kept_matches = Vec::with_capacity(before);
        let mut kept_checked = Vec::with_capacity(before);
        for (m, checked) in file.results.matches.drain(..).zip(file.checked.drain(..)) {
            if applied.iter().any(|a| a.start == m.start) {
                continue;
            }
            kept_matches.push(m);
            kept_checked.push(checked);
        }
        let removed = before - kept_matches.len();
        file.results.matches = kept_matches;
        file.checked = kept_checked;
        self.total_matches = self.total_matches.saturating_sub(removed);

        if self.files[index].results.matches.is_empty() {
            self.files.remove(index);
        }
        removed > 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/search.rs"]
mod tests;
