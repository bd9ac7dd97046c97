use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// 文件掩码匹配是否区分大小写
    #[serde(default = "default_case_sensitive_masks")]
    pub case_sensitive_masks: bool,
    /// 目录搜索时排除的文件名 glob
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_regex: Option<String>,
    /// 未指定掩码时使用的默认掩码（空 = 所有文件）
    #[serde(default)]
    pub mask: Vec<String>,
}

fn default_case_sensitive_masks() -> bool {
    !cfg!(windows)
}

fn default_exclude() -> Vec<String> {
    [
        "*.o", "*.a", "*.so", "*.dll", "*.exe", "*.obj", "*.lib", "*.pyc", "*.pyo", "*.class",
        "*.swp", "*~", "*.bak", "*.orig",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            case_sensitive_masks: default_case_sensitive_masks(),
            exclude: default_exclude(),
            exclude_regex: None,
            mask: Vec::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
        }
    }
}
