//! Service adapters: OS/runtime specific implementations (IO/threads).

pub mod paths;
pub mod search;
pub mod settings;

pub use paths::{ensure_log_dir, get_app_data_dir, get_log_dir, get_settings_path};
pub use search::{
    apply_replacements, compile_pattern, enumerate_files, expand, FileFilter, FileMask,
    PositionMapper, ReplaceCoordinator, SearchCoordinator, SearchOptions, SearchRequest,
    SearchScope,
};
pub use settings::{ensure_settings_file, load_settings, load_settings_from, SettingsError};
