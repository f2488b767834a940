use std::sync::Arc;
use log::{debug, info};
use crate::errors::WikiError;
use crate::services::VersionControl;
use crate::types::SearchMatch;

/// Content search over the wiki repository
#[derive(Clone)]
pub struct SearchService {
    git: Arc<dyn VersionControl>,
}

impl SearchService {
    /// Create a new search service
    pub fn new(git: Arc<dyn VersionControl>) -> Self {
        Self { git }
    }

    /// Search page contents and names for `text`
    pub async fn search(&self, text: &str) -> Result<Vec<SearchMatch>, WikiError> {
        if text.trim().is_empty() {
            debug!("Empty search query received");
            return Ok(Vec::new());
        }

        let start_time = std::time::Instant::now();
        let lines = self.git.grep(text).await?;
        let results: Vec<SearchMatch> = lines.iter().filter_map(|line| parse_match(line)).collect();

        info!(
            "Search for '{}' completed in {}ms, found {} results",
            text,
            start_time.elapsed().as_millis(),
            results.len()
        );
        Ok(results)
    }
}

/// `path.md:line:text` into a match; `:` inside the text survives
fn parse_match(line: &str) -> Option<SearchMatch> {
    if line.trim().is_empty() {
        return None;
    }
    let mut fields = line.split(':');
    let file = fields.next().unwrap_or("");
    let page_name = match file.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file,
    };
    let line_number = fields.next().unwrap_or("");
    let text = fields.collect::<Vec<_>>().join(":");
    Some(SearchMatch {
        page_name: page_name.to_string(),
        line: line_number.to_string(),
        text,
    })
}
