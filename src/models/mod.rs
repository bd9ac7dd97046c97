//! 数据模型层

pub mod documents;
pub mod text_buffer;

pub use documents::{Document, OpenDocuments};
pub use text_buffer::{slice_to_cow, TextBuffer};
