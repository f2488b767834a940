use crate::services::Diff;
use crate::types::PageMetadata;

/// A page changed since the digest cutoff
#[derive(Debug, Clone)]
pub struct FileWithChangelist {
    pub file: String,
    pub changelist: Vec<PageMetadata>,
    pub diff: Diff,
}

/// Directory and the pages in it that changed since the digest cutoff
#[derive(Debug, Clone)]
pub struct DirectoryWithChangedFiles {
    pub dir: String,
    pub files: Vec<FileWithChangelist>,
}

impl DirectoryWithChangedFiles {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into(), files: Vec::new() }
    }

    pub fn add_file(&mut self, file: FileWithChangelist) {
        self.files.push(file);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
