use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info, warn};

use crate::errors::WikiError;
use crate::services::VersionControl;
use crate::types::{Blogpost, BLOG_ENTRY_FILE_PATTERN};
use crate::utils::ensure_safe_name;

/// Lists the blog posts kept in a group's wiki directory
#[derive(Clone)]
pub struct BlogService {
    git: Arc<dyn VersionControl>,
}

impl BlogService {
    pub fn new(git: Arc<dyn VersionControl>) -> Self {
        Self { git }
    }

    /// Valid posts of `group`, newest first
    pub async fn blogposts_for_group(&self, group: &str) -> Result<Vec<Blogpost>, WikiError> {
        ensure_safe_name(group)?;
        let paths = self.git.ls_blogposts(group, BLOG_ENTRY_FILE_PATTERN).await?;
        if paths.is_empty() {
            debug!("No blog posts for group {}", group);
            return Ok(Vec::new());
        }

        let reads = paths.iter().map(|path| async move {
            let content = self.git.read_file_fs(path).await?;
            let post = Blogpost::parse(path, &content);
            if post.is_none() {
                warn!("Skipping malformed blog post {}", path);
            }
            Ok::<_, WikiError>(post)
        });
        let mut posts: Vec<Blogpost> = try_join_all(reads).await?.into_iter().flatten().collect();

        posts.sort_by(|a, b| b.date().cmp(&a.date()));
        info!("Found {} blog posts for group {}", posts.len(), group);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeGit;
    use time::macros::date;

    #[tokio::test]
    async fn newest_first_and_malformed_dropped() {
        let git = Arc::new(FakeGit::new());
        git.put_file("craftsmen/blog_2013-05-01_spring.md", "# Spring meetup\nteaser");
        git.put_file("craftsmen/blog_2014-01-15_winter.md", "# Winter meetup");
        git.put_file("craftsmen/blog_2013-11-3_autumn.md", "Autumn");
        git.put_file("craftsmen/blog_nodate.md", "# No date here");
        git.put_file("craftsmen/blog_2013-06-01_untitled.md", "");
        git.put_file("craftsmen/notes.md", "# Not a blog post");

        let posts = BlogService::new(git).blogposts_for_group("craftsmen").await.unwrap();

        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Winter meetup", "Autumn", "Spring meetup"]);
        assert!(posts.windows(2).all(|w| w[0].date() >= w[1].date()));
        assert_eq!(posts[2].date(), date!(2013 - 05 - 01));
    }

    #[tokio::test]
    async fn group_without_posts_is_empty() {
        let git = Arc::new(FakeGit::new());
        git.put_file("craftsmen/notes.md", "# Notes");
        assert!(BlogService::new(git).blogposts_for_group("craftsmen").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_failure_fails_the_listing() {
        let git = Arc::new(FakeGit::new());
        git.put_file("craftsmen/blog_2013-05-01_a.md", "# A");
        git.put_file("craftsmen/blog_2013-05-02_b.md", "# B");
        git.fail_on("craftsmen/blog_2013-05-02_b.md");

        let err = BlogService::new(git).blogposts_for_group("craftsmen").await.unwrap_err();

        assert!(matches!(err, WikiError::Gateway { .. }));
    }
}
