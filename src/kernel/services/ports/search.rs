use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use std::sync::Arc;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Io(io::Error),
    InvalidRegex(regex::Error),
    InvalidGlob(glob::PatternError),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Io(e) => write!(f, "IO error: {}", e),
            SearchError::InvalidRegex(e) => write!(f, "Invalid regex: {}", e),
            SearchError::InvalidGlob(e) => write!(f, "Invalid file mask: {}", e),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<io::Error> for SearchError {
    fn from(e: io::Error) -> Self {
        SearchError::Io(e)
    }
}

impl From<regex::Error> for SearchError {
    fn from(e: regex::Error) -> Self {
        SearchError::InvalidRegex(e)
    }
}

impl From<glob::PatternError> for SearchError {
    fn from(e: glob::PatternError) -> Self {
        SearchError::InvalidGlob(e)
    }
}

/// 单个文件替换失败的原因，只影响该文件
#[derive(Debug)]
pub enum ReplaceError {
    Read { path: PathBuf, source: io::Error },
    Decode { path: PathBuf, source: FromUtf8Error },
    Write { path: PathBuf, source: io::Error },
    /// 文件内容在搜索之后发生了变化，记录的偏移已不可信
    Stale { path: PathBuf, offset: usize },
}

impl ReplaceError {
    pub fn path(&self) -> &Path {
        match self {
            ReplaceError::Read { path, .. }
            | ReplaceError::Decode { path, .. }
            | ReplaceError::Write { path, .. }
            | ReplaceError::Stale { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ReplaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplaceError::Read { path, source } => {
                write!(f, "Error opening file {}: {}", path.display(), source)
            }
            ReplaceError::Decode { path, source } => write!(
                f,
                "File {} not read: unicode error '{}'. File may be corrupted",
                path.display(),
                source
            ),
            ReplaceError::Write { path, source } => write!(
                f,
                "Error while saving replaced content of {}: {}",
                path.display(),
                source
            ),
            ReplaceError::Stale { path, offset } => write!(
                f,
                "File {} changed since search (mismatch at byte {}), not replaced",
                path.display(),
                offset
            ),
        }
    }
}

impl std::error::Error for ReplaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplaceError::Read { source, .. } | ReplaceError::Write { source, .. } => Some(source),
            ReplaceError::Decode { source, .. } => Some(source),
            ReplaceError::Stale { .. } => None,
        }
    }
}

/// 文件名排除规则（构建产物、临时文件等）
pub trait ExclusionFilter: Send + Sync {
    fn matches(&self, file_name: &str) -> bool;
}

/// 不排除任何文件
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusion;

impl ExclusionFilter for NoExclusion {
    fn matches(&self, _file_name: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPosition {
    /// 1-based
    pub line: usize,
    /// 0-based, counted in chars
    pub col: usize,
}

impl TextPosition {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// One located occurrence of the pattern.
///
/// `start`/`end` are byte offsets into the text the match was found in. `groups[0]` is the
/// whole match; further entries are the capture groups, `None` when a group did not
/// participate in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub path: PathBuf,
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Option<String>>,
    pub group_names: Arc<[Option<String>]>,
    pub line: usize,
    pub col: usize,
    pub line_text: String,
}

impl MatchRecord {
    pub fn matched_text(&self) -> &str {
        self.groups
            .first()
            .and_then(|g| g.as_deref())
            .unwrap_or_default()
    }

    pub fn position(&self) -> TextPosition {
        TextPosition::new(self.line, self.col)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResults {
    /// 目录搜索时为搜索根目录；在已打开文档中搜索时为 None
    pub root: Option<PathBuf>,
    pub path: PathBuf,
    pub matches: Vec<MatchRecord>,
}

/// Matches selected for replacement, grouped per file.
///
/// Each file's matches are kept sorted by ascending `start` regardless of the order they
/// were inserted in; replacement walks them back to front so that earlier offsets stay
/// valid while later ranges are rewritten.
#[derive(Debug, Clone, Default)]
pub struct ReplaceBatch {
    files: BTreeMap<PathBuf, Vec<MatchRecord>>,
}

impl ReplaceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = MatchRecord>,
    {
        let mut batch = Self::new();
        for record in records {
            batch.insert(record);
        }
        batch
    }

    /// 插入一条匹配，保持文件内按 start 升序；同一 start 只保留一条
    pub fn insert(&mut self, record: MatchRecord) {
        let matches = self.files.entry(record.path.clone()).or_default();
        match matches.binary_search_by_key(&record.start, |m| m.start) {
            Ok(_) => {}
            Err(idx) => matches.insert(idx, record),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn match_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn matches_for(&self, path: &Path) -> Option<&[MatchRecord]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<MatchRecord>)> {
        self.files.iter()
    }

    pub fn into_files(self) -> BTreeMap<PathBuf, Vec<MatchRecord>> {
        self.files
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Enumerating,
    Scanning,
    Completed,
    Cancelled,
}

impl SearchState {
    pub fn is_running(self) -> bool {
        matches!(self, SearchState::Enumerating | SearchState::Scanning)
    }
}

#[derive(Debug, Clone)]
pub enum SearchMessage {
    /// `current == None` 表示仍在统计文件数量
    Progress {
        search_id: u64,
        current: Option<usize>,
        total: usize,
    },
    Results {
        search_id: u64,
        results: Vec<FileResults>,
    },
    Error {
        search_id: u64,
        path: Option<PathBuf>,
        message: String,
    },
    Finished {
        search_id: u64,
        state: SearchState,
        files_searched: usize,
        total_matches: usize,
    },
}

impl SearchMessage {
    pub fn search_id(&self) -> u64 {
        match self {
            SearchMessage::Progress { search_id, .. }
            | SearchMessage::Results { search_id, .. }
            | SearchMessage::Error { search_id, .. }
            | SearchMessage::Finished { search_id, .. } => *search_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReplaceMessage {
    Applied {
        replace_id: u64,
        path: PathBuf,
        matches: Vec<MatchRecord>,
    },
    Error {
        replace_id: u64,
        path: PathBuf,
        message: String,
    },
    Finished {
        replace_id: u64,
        replacements: usize,
        elapsed: Duration,
        cancelled: bool,
    },
}

impl ReplaceMessage {
    pub fn replace_id(&self) -> u64 {
        match self {
            ReplaceMessage::Applied { replace_id, .. }
            | ReplaceMessage::Error { replace_id, .. }
            | ReplaceMessage::Finished { replace_id, .. } => *replace_id,
        }
    }

    /// 最终状态文本，例如 "3 replacements in 0 second(s)"
    pub fn summary(&self) -> Option<String> {
        match self {
            ReplaceMessage::Finished {
                replacements,
                elapsed,
                ..
            } => Some(format!(
                "{} replacements in {} second(s)",
                replacements,
                elapsed.as_secs()
            )),
            _ => None,
        }
    }
}
