//! Service ports: traits + data contracts.

pub mod document;
pub mod search;
pub mod settings;

pub use document::{DocumentAccess, DocumentHandle, DocumentSnapshot};
pub use search::{
    ExclusionFilter, FileResults, MatchRecord, NoExclusion, ReplaceBatch, ReplaceError,
    ReplaceMessage, SearchError, SearchMessage, SearchState, TextPosition,
};
pub use settings::{SearchSettings, Settings};
