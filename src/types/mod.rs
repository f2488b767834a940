use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;

use crate::services::{BlogService, DigestService, VersionControl, WikiService};

mod blogpost;
mod digest;

pub use blogpost::{is_blog_entry, Blogpost, BLOG_ENTRY_FILE_PATTERN, BLOG_ENTRY_PREFIX};
pub use digest::{DirectoryWithChangedFiles, FileWithChangelist};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub wiki: Arc<WikiService>,
    pub blog: Arc<BlogService>,
    pub digest: Arc<DigestService>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Wire all services to one gateway
    pub fn new(git: Arc<dyn VersionControl>, static_dir: PathBuf) -> Self {
        Self {
            wiki: Arc::new(WikiService::new(git.clone())),
            blog: Arc::new(BlogService::new(git.clone())),
            digest: Arc::new(DigestService::new(git)),
            static_dir: Arc::new(static_dir),
        }
    }
}

/// One revision of a page as reported by `git log`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    /// Repository-relative file name the revision touched
    pub name: String,
    pub hash_ref: String,
    pub fullhash: String,
    pub author: String,
    pub date: OffsetDateTime,
    pub comment: String,
}

/// History shown next to the page editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// The page has never been committed
    New,
    Revision(PageMetadata),
}

/// Content and latest history entry of a page about to be edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditablePage {
    pub content: String,
    pub history: Vec<HistoryEntry>,
}

/// Form data submitted when saving a page
#[derive(Debug, Clone, Default)]
pub struct SaveBody {
    pub content: String,
    pub comment: String,
    /// Full hash of the revision the editor started from
    pub metadata: String,
}

/// Page within a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// `dir/page` without the file extension
    pub full_name: String,
    pub name: String,
}

/// Search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub page_name: String,
    /// Line number as printed by git; empty for file-name matches
    pub line: String,
    pub text: String,
}

/// Markdown rendering result
#[derive(Debug, Clone)]
pub struct MarkdownResult {
    pub html: String,
    pub toc: String,
    pub title: Option<String>,
}

/// Identity recorded as the author of wiki commits
pub trait GitAuthor: Send + Sync {
    /// `Name <email>` as accepted by `git commit --author`
    fn as_git_author(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct Member {
    pub nickname: String,
    pub email: String,
}

impl Member {
    pub fn new(nickname: impl Into<String>, email: impl Into<String>) -> Self {
        Self { nickname: nickname.into(), email: email.into() }
    }
}

impl GitAuthor for Member {
    fn as_git_author(&self) -> String {
        format!("{} <{}>", self.nickname, self.email)
    }
}
