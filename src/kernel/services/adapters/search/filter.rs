//! 文件名过滤
//!
//! - FileMask: 用户输入的掩码（"*.rs *.toml"），多个 glob 取并集，匹配文件 basename
//! - FileFilter: 全局排除规则（glob 列表 + 可选正则），用于目录遍历

use crate::kernel::services::ports::search::{ExclusionFilter, Result};
use glob::{MatchOptions, Pattern};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct FileMask {
    patterns: Vec<Pattern>,
    options: MatchOptions,
}

impl FileMask {
    /// Build a mask from glob strings. Returns `Ok(None)` when no pattern is given,
    /// meaning every file passes.
    pub fn new<S: AsRef<str>>(patterns: &[S], case_sensitive: bool) -> Result<Option<Self>> {
        let patterns = patterns
            .iter()
            .flat_map(|p| p.as_ref().split_whitespace())
            .map(Pattern::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            patterns,
            options: MatchOptions {
                case_sensitive,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        }))
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(file_name, self.options))
    }
}

/// 排除规则：任一 glob 或正则命中即排除
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    globs: Vec<Pattern>,
    regex: Option<Regex>,
}

impl FileFilter {
    pub fn new<S: AsRef<str>>(globs: &[S], regex: Option<&str>) -> Result<Self> {
        let globs = globs
            .iter()
            .map(|g| Pattern::new(g.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let regex = match regex {
            Some(r) if !r.is_empty() => Some(Regex::new(r)?),
            _ => None,
        };
        Ok(Self { globs, regex })
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty() && self.regex.is_none()
    }
}

impl ExclusionFilter for FileFilter {
    fn matches(&self, file_name: &str) -> bool {
        self.globs.iter().any(|g| g.matches(file_name))
            || self.regex.as_ref().is_some_and(|r| r.is_match(file_name))
    }
}
