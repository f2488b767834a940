use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::WikiError;
use crate::services::{Diff, SearchService, VersionControl};
use crate::types::{
    is_blog_entry, EditablePage, GitAuthor, HistoryEntry, PageEntry, PageMetadata, SaveBody, SearchMatch,
};
use crate::utils::{ensure_safe_name, ensure_safe_revision, page_file, strip_page_extension};

/// Maximum number of revisions shown in a page history
pub const HISTORY_LIMIT: usize = 30;

/// Page-level operations on the wiki repository
#[derive(Clone)]
pub struct WikiService {
    git: Arc<dyn VersionControl>,
    search: SearchService,
}

impl WikiService {
    pub fn new(git: Arc<dyn VersionControl>) -> Self {
        debug!("Creating WikiService");
        let search = SearchService::new(git.clone());
        Self { git, search }
    }

    /// Content of a page at `revision`
    pub async fn show_page(&self, name: &str, revision: &str) -> Result<String, WikiError> {
        ensure_safe_name(name)?;
        ensure_safe_revision(revision)?;
        self.git.read_file(&page_file(name), revision).await
    }

    /// Current content and latest revision of a page, or an empty new page
    pub async fn page_edit(&self, name: &str) -> Result<EditablePage, WikiError> {
        ensure_safe_name(name)?;
        let file = page_file(name);
        if !self.git.exists(&file).await? {
            debug!("Editing new page {}", name);
            return Ok(EditablePage { content: String::new(), history: vec![HistoryEntry::New] });
        }
        let content = self.git.read_file(&file, "HEAD").await?;
        let history = self
            .git
            .log(&file, "HEAD", 1)
            .await?
            .into_iter()
            .map(HistoryEntry::Revision)
            .collect();
        Ok(EditablePage { content, history })
    }

    pub async fn page_rename(
        &self,
        dir: &str,
        old_name: &str,
        new_name: &str,
        author: &dyn GitAuthor,
    ) -> Result<(), WikiError> {
        let old_file = page_file(&format!("{}/{}", dir, old_name));
        let new_file = page_file(&format!("{}/{}", dir, new_name));
        ensure_safe_name(&old_file)?;
        ensure_safe_name(&new_file)?;
        let message = format!("rename: \"{}\" -> \"{}\"", old_name, new_name);
        self.git.mv(&old_file, &new_file, &message, &author.as_git_author()).await?;
        info!("Renamed {} to {}", old_file, new_file);
        Ok(())
    }

    /// Write and commit a page; returns `true` if the page changed since
    /// the revision in `body.metadata`. The write happens either way.
    pub async fn page_save(
        &self,
        dir: &str,
        name: &str,
        body: &SaveBody,
        author: &dyn GitAuthor,
    ) -> Result<bool, WikiError> {
        let file = page_file(&format!("{}/{}", dir, name));
        ensure_safe_name(&file)?;

        if !self.git.exists(dir).await? {
            match self.git.create_dir(dir).await {
                Ok(()) => debug!("Created directory {}", dir),
                Err(WikiError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Directory {} was created concurrently", dir)
                }
                Err(e) => return Err(e),
            }
        }

        self.git.write_file(&file, &body.content).await?;

        let latest = self.git.log(&file, "HEAD", 1).await?;
        let conflict = latest.first().is_some_and(|m| m.fullhash != body.metadata);
        if conflict {
            warn!("Saving {} over a newer revision than the one edited", file);
        }

        let comment = if body.comment.is_empty() { "no comment" } else { body.comment.as_str() };
        self.git.add(&file, comment, &author.as_git_author()).await?;
        info!("Saved {} (conflict: {})", file, conflict);
        Ok(conflict)
    }

    /// Up to [`HISTORY_LIMIT`] revisions, newest first
    pub async fn page_history(&self, name: &str) -> Result<Vec<PageMetadata>, WikiError> {
        ensure_safe_name(name)?;
        let file = page_file(name);
        self.git.read_file(&file, "HEAD").await?;
        let mut history = self.git.log(&file, "HEAD", HISTORY_LIMIT).await?;
        history.truncate(HISTORY_LIMIT);
        Ok(history)
    }

    pub async fn page_compare(&self, name: &str, revisions: &str) -> Result<Diff, WikiError> {
        ensure_safe_name(name)?;
        ensure_safe_revision(revisions)?;
        let raw = self.git.diff(&page_file(name), revisions).await?;
        Ok(Diff::parse(&raw))
    }

    pub async fn page_list(&self, dir: &str) -> Result<Vec<PageEntry>, WikiError> {
        ensure_safe_name(dir)?;
        let files = self.git.ls(dir).await?;
        Ok(files.iter().map(|file| page_entry(file)).collect())
    }

    pub async fn search(&self, text: &str) -> Result<Vec<SearchMatch>, WikiError> {
        self.search.search(text).await
    }

    /// Files recently changed in `dir`, one entry per file, blog posts excluded
    pub async fn list_changed_files_in_directory(&self, dir: &str) -> Result<Vec<PageMetadata>, WikiError> {
        ensure_safe_name(dir)?;
        let log = self.git.log(dir, "HEAD", HISTORY_LIMIT).await?;
        let mut seen = HashSet::new();
        Ok(log
            .into_iter()
            .filter(|m| seen.insert(m.name.clone()))
            .filter(|m| !is_blog_entry(&m.name))
            .collect())
    }

    /// Top-level wiki directories
    pub async fn directories(&self) -> Result<Vec<String>, WikiError> {
        self.git.lsdirs().await
    }
}

pub(crate) fn page_entry(file: &str) -> PageEntry {
    let full_name = strip_page_extension(file).to_string();
    let name = Path::new(&full_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| full_name.clone());
    PageEntry { full_name, name }
}
