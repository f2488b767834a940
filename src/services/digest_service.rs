use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, error, info};
use time::OffsetDateTime;

use crate::errors::WikiError;
use crate::services::wiki_service::page_entry;
use crate::services::git_gateway::git_timestamp;
use crate::services::{Diff, VersionControl};
use crate::types::{DirectoryWithChangedFiles, FileWithChangelist, PageEntry};
use crate::utils::page_file;

/// Collects every page changed since a point in time, grouped by directory
#[derive(Clone)]
pub struct DigestService {
    git: Arc<dyn VersionControl>,
}

impl DigestService {
    pub fn new(git: Arc<dyn VersionControl>) -> Self {
        Self { git }
    }

    /// Directories with at least one page changed after `cutoff`
    pub async fn find_pages_for_digest_since(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<DirectoryWithChangedFiles>, WikiError> {
        let range = format!("HEAD@{{{}}}..HEAD", git_timestamp(cutoff)?);
        let revisions = range.as_str();
        let dirs = self.git.lsdirs().await?;
        debug!("Scanning {} directories for changes since {}", dirs.len(), cutoff);

        let scans = dirs.iter().map(|dir| async move {
            self.changed_files_in(dir, cutoff, revisions).await.inspect_err(|e| {
                error!("Digest scan of {} failed: {}", dir, e);
            })
        });
        let result: Vec<DirectoryWithChangedFiles> =
            try_join_all(scans).await?.into_iter().filter(|d| !d.is_empty()).collect();

        info!("Digest since {} found changes in {} directories", cutoff, result.len());
        Ok(result)
    }

    async fn changed_files_in(
        &self,
        dir: &str,
        cutoff: OffsetDateTime,
        revisions: &str,
    ) -> Result<DirectoryWithChangedFiles, WikiError> {
        let pages: Vec<PageEntry> = self.git.ls(dir).await?.iter().map(|f| page_entry(f)).collect();
        let changes = pages.iter().map(|page| self.changes_of(page, cutoff, revisions));

        let mut line = DirectoryWithChangedFiles::new(dir);
        for file in try_join_all(changes).await?.into_iter().flatten() {
            line.add_file(file);
        }
        Ok(line)
    }

    async fn changes_of(
        &self,
        page: &PageEntry,
        cutoff: OffsetDateTime,
        revisions: &str,
    ) -> Result<Option<FileWithChangelist>, WikiError> {
        let file = page_file(&page.full_name);
        let changelist = self.git.latest_changes(&file, cutoff).await?;
        if changelist.is_empty() {
            return Ok(None);
        }
        let diff = Diff::parse(&self.git.diff(&file, revisions).await?);
        Ok(Some(FileWithChangelist { file: page.name.clone(), changelist, diff }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeGit;
    use time::macros::datetime;

    fn repo() -> Arc<FakeGit> {
        let git = Arc::new(FakeGit::new());
        git.set_clock(datetime!(2024-01-01 00:00 UTC));
        git.commit_file("team/notes.md", "old", "initial");
        git.commit_file("quiet/readme.md", "untouched", "initial");
        git.commit_file("craft/agenda.md", "old", "initial");
        git.set_clock(datetime!(2024-02-01 00:00 UTC));
        git.commit_file("team/notes.md", "new", "update");
        git.commit_file("craft/agenda.md", "new", "update");
        git.commit_file("team/minutes.md", "fresh", "create");
        git.set_diff("team/notes.md", "diff --git a/team/notes.md b/team/notes.md\n@@ -1 +1 @@\n-old\n+new\n");
        git
    }

    #[tokio::test]
    async fn reports_only_directories_with_changes() {
        let git = repo();
        let digest = DigestService::new(git);

        let result = digest.find_pages_for_digest_since(datetime!(2024-01-15 00:00 UTC)).await.unwrap();

        let dirs: Vec<&str> = result.iter().map(|d| d.dir.as_str()).collect();
        assert_eq!(dirs, vec!["craft", "team"]);
        assert!(result.iter().all(|d| !d.files.is_empty()));

        let team = &result[1];
        let files: Vec<&str> = team.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["minutes", "notes"]);
        assert_eq!(team.files[1].changelist.len(), 1);
        assert_eq!(team.files[1].changelist[0].comment, "update");
        assert_eq!(team.files[1].diff.added(), 1);
    }

    #[tokio::test]
    async fn nothing_changed_is_empty() {
        let git = repo();
        let result = DigestService::new(git)
            .find_pages_for_digest_since(datetime!(2024-06-01 00:00 UTC))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn item_failure_fails_the_scan() {
        let git = repo();
        git.fail_on("craft/agenda.md");

        let err = DigestService::new(git)
            .find_pages_for_digest_since(datetime!(2024-01-15 00:00 UTC))
            .await
            .unwrap_err();

        assert!(matches!(err, WikiError::Gateway { .. }));
    }
}
