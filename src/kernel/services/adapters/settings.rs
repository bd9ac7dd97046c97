use super::paths::get_settings_path;
use super::search::{FileFilter, FileMask};
use crate::kernel::services::ports::search::SearchError;
use crate::kernel::services::ports::settings::{SearchSettings, Settings};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Invalid settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

pub fn ensure_settings_file() -> std::io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine settings directory",
        )
    })?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content =
            serde_json::to_string_pretty(&Settings::default()).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(&path, content)?;
    }
    Ok(path)
}

/// 读取默认位置的配置；文件不存在或无法解析时返回 None
pub fn load_settings() -> Option<Settings> {
    let path = get_settings_path()?;
    match load_settings_from(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "settings not loaded");
            None
        }
    }
}

pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

impl SearchSettings {
    pub fn exclusion_filter(&self) -> Result<FileFilter, SearchError> {
        FileFilter::new(&self.exclude, self.exclude_regex.as_deref())
    }

    /// 用户给出的掩码优先，否则使用配置中的默认掩码
    pub fn file_mask(&self, user_mask: &[String]) -> Result<Option<FileMask>, SearchError> {
        let patterns = if user_mask.is_empty() {
            self.mask.as_slice()
        } else {
            user_mask
        };
        FileMask::new(patterns, self.case_sensitive_masks)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
