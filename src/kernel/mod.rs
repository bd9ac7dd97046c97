//! Headless search/replace core.

pub mod search;
pub mod services;

pub use search::{SearchFileResult, SearchResultsModel};
