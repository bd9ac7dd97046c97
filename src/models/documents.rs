//! 已打开文档集合
//!
//! 以路径为键保存编辑器中的缓冲区，并向搜索替换服务暴露 `DocumentAccess`。

use super::text_buffer::TextBuffer;
use crate::kernel::services::ports::{DocumentAccess, DocumentHandle, DocumentSnapshot};
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct Document {
    pub buffer: TextBuffer,
    saved_version: u64,
}

impl Document {
    fn new(buffer: TextBuffer) -> Self {
        let saved_version = buffer.version();
        Self {
            buffer,
            saved_version,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.version() != self.saved_version
    }
}

#[derive(Default)]
pub struct OpenDocuments {
    docs: FxHashMap<PathBuf, Document>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: impl Into<PathBuf>, text: &str) {
        self.docs
            .insert(path.into(), Document::new(TextBuffer::from_text(text)));
    }

    pub fn open_file(&mut self, path: &Path) -> io::Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.open(path, &text);
        Ok(())
    }

    pub fn close(&mut self, path: &Path) -> Option<Document> {
        self.docs.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&Document> {
        self.docs.get(path)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn is_dirty(&self, path: &Path) -> bool {
        self.docs.get(path).is_some_and(Document::is_dirty)
    }

    pub fn save(&mut self, path: &Path) -> io::Result<()> {
        let Some(doc) = self.docs.get_mut(path) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("document not open: {}", path.display()),
            ));
        };
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        doc.buffer.write_to(&mut file)?;
        io::Write::flush(&mut file)?;
        doc.saved_version = doc.buffer.version();
        Ok(())
    }
}

impl DocumentAccess for OpenDocuments {
    fn open_documents(&self) -> DocumentSnapshot {
        self.docs
            .iter()
            .map(|(path, doc)| (path.clone(), doc.buffer.text()))
            .collect()
    }

    fn find_document(&mut self, path: &Path) -> Option<&mut dyn DocumentHandle> {
        self.docs
            .get_mut(path)
            .map(|doc| &mut doc.buffer as &mut dyn DocumentHandle)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/documents.rs"]
mod tests;
