//! In-memory [`VersionControl`] used by the service tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::errors::WikiError;
use crate::services::VersionControl;
use crate::types::PageMetadata;
use crate::utils::{matches_pattern, PAGE_EXTENSION};

const ROOT: &str = "/repo";

#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub paths: Vec<String>,
    pub date: OffsetDateTime,
    snapshot: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    worktree: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    commits: Vec<FakeCommit>,
    diffs: HashMap<String, String>,
    grep_lines: Vec<String>,
    racing_dirs: HashSet<String>,
    failing: HashSet<String>,
    clock: Option<OffsetDateTime>,
}

impl State {
    fn head(&self) -> BTreeMap<String, String> {
        self.commits.last().map(|c| c.snapshot.clone()).unwrap_or_default()
    }

    fn commit(&mut self, message: &str, author: &str, paths: Vec<String>) {
        let n = self.commits.len() as i64;
        let date = self.clock.unwrap_or(datetime!(2024-01-01 00:00 UTC) + Duration::minutes(n));
        self.clock = self.clock.map(|c| c + Duration::minutes(1));
        let mut snapshot = self.head();
        for path in &paths {
            match self.worktree.get(path) {
                Some(content) => snapshot.insert(path.clone(), content.clone()),
                None => snapshot.remove(path),
            };
        }
        self.commits.push(FakeCommit {
            hash: format!("{:040x}", n + 1),
            message: message.to_string(),
            author: author.to_string(),
            paths,
            date,
            snapshot,
        });
    }

    fn check(&self, path: &str) -> Result<(), WikiError> {
        if self.failing.contains(path) {
            return Err(WikiError::gateway(format!("fake {}", path), "injected failure"));
        }
        Ok(())
    }

    fn metadata(&self, path: &str, keep: impl Fn(&FakeCommit) -> bool) -> Vec<PageMetadata> {
        let prefix = format!("{}/", path);
        self.commits
            .iter()
            .rev()
            .filter(|c| keep(c))
            .filter_map(|c| {
                let name = c.paths.iter().find(|p| *p == path || p.starts_with(&prefix))?;
                Some(PageMetadata {
                    name: name.clone(),
                    hash_ref: c.hash[..7].to_string(),
                    fullhash: c.hash.clone(),
                    author: c.author.clone(),
                    date: c.date,
                    comment: c.message.clone(),
                })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FakeGit {
    state: Mutex<State>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Write and commit a file in one step
    pub fn commit_file(&self, path: &str, content: &str, message: &str) {
        let mut state = self.state();
        state.worktree.insert(path.to_string(), content.to_string());
        state.commit(message, "fixture <fixture@example.org>", vec![path.to_string()]);
    }

    /// Place a file in the working tree without committing it
    pub fn put_file(&self, path: &str, content: &str) {
        self.state().worktree.insert(path.to_string(), content.to_string());
    }

    /// Timestamp of the next commit; later commits advance by a minute each
    pub fn set_clock(&self, at: OffsetDateTime) {
        self.state().clock = Some(at);
    }

    pub fn set_diff(&self, path: &str, raw: &str) {
        self.state().diffs.insert(path.to_string(), raw.to_string());
    }

    pub fn set_grep_output(&self, raw: &str) {
        self.state().grep_lines = raw.split('\n').map(str::to_string).collect();
    }

    /// Make `create_dir` report that someone else created `dir` first
    pub fn race_directory_creation(&self, dir: &str) {
        self.state().racing_dirs.insert(dir.to_string());
    }

    /// Fail every read, log and diff of `path`
    pub fn fail_on(&self, path: &str) {
        self.state().failing.insert(path.to_string());
    }

    pub fn last_commit(&self) -> Option<FakeCommit> {
        self.state().commits.last().cloned()
    }

    pub fn head_hash(&self, path: &str) -> Option<String> {
        self.state().metadata(path, |_| true).first().map(|m| m.fullhash.clone())
    }

    pub fn has_dir(&self, dir: &str) -> bool {
        self.state().dirs.contains(dir)
    }
}

fn relative(path: &str) -> &str {
    path.strip_prefix(ROOT).map(|p| p.trim_start_matches('/')).unwrap_or(path)
}

#[async_trait]
impl VersionControl for FakeGit {
    async fn read_file(&self, path: &str, revision: &str) -> Result<String, WikiError> {
        let state = self.state();
        state.check(path)?;
        let snapshot = if revision == "HEAD" {
            state.head()
        } else {
            state
                .commits
                .iter()
                .find(|c| c.hash.starts_with(revision))
                .map(|c| c.snapshot.clone())
                .ok_or_else(|| WikiError::NotFound(revision.to_string()))?
        };
        snapshot
            .get(path)
            .cloned()
            .ok_or_else(|| WikiError::NotFound(format!("{}:{}", revision, path)))
    }

    async fn log(&self, path: &str, _revision: &str, limit: usize) -> Result<Vec<PageMetadata>, WikiError> {
        let state = self.state();
        state.check(path)?;
        let mut entries = state.metadata(path, |_| true);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn diff(&self, path: &str, _revisions: &str) -> Result<String, WikiError> {
        let state = self.state();
        state.check(path)?;
        Ok(state.diffs.get(path).cloned().unwrap_or_default())
    }

    async fn ls(&self, dir: &str) -> Result<Vec<String>, WikiError> {
        let state = self.state();
        state.check(dir)?;
        let prefix = format!("{}/", dir);
        Ok(state
            .head()
            .into_keys()
            .filter(|p| p.starts_with(&prefix) && p.ends_with(PAGE_EXTENSION))
            .collect())
    }

    async fn lsdirs(&self) -> Result<Vec<String>, WikiError> {
        let dirs: BTreeSet<String> = self
            .state()
            .head()
            .into_keys()
            .filter_map(|p| p.split_once('/').map(|(d, _)| d.to_string()))
            .collect();
        Ok(dirs.into_iter().collect())
    }

    async fn ls_blogposts(&self, group: &str, pattern: &str) -> Result<Vec<String>, WikiError> {
        let prefix = format!("{}/", group);
        Ok(self
            .state()
            .worktree
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix).map(|name| (p, name)))
            .filter(|(_, name)| !name.contains('/') && matches_pattern(name, pattern))
            .map(|(p, _)| format!("{}/{}", ROOT, p))
            .collect())
    }

    async fn read_file_fs(&self, path: &str) -> Result<String, WikiError> {
        let state = self.state();
        let rel = relative(path);
        state.check(rel)?;
        state
            .worktree
            .get(rel)
            .cloned()
            .ok_or_else(|| WikiError::NotFound(path.to_string()))
    }

    async fn grep(&self, _text: &str) -> Result<Vec<String>, WikiError> {
        Ok(self.state().grep_lines.clone())
    }

    async fn mv(&self, old_path: &str, new_path: &str, message: &str, author: &str) -> Result<(), WikiError> {
        let mut state = self.state();
        let content = state
            .worktree
            .remove(old_path)
            .ok_or_else(|| WikiError::gateway(format!("mv {} {}", old_path, new_path), "bad source"))?;
        state.worktree.insert(new_path.to_string(), content);
        state.commit(message, author, vec![old_path.to_string(), new_path.to_string()]);
        Ok(())
    }

    async fn add(&self, path: &str, message: &str, author: &str) -> Result<(), WikiError> {
        let mut state = self.state();
        state.check(path)?;
        state.commit(message, author, vec![path.to_string()]);
        Ok(())
    }

    async fn latest_changes(&self, path: &str, since: OffsetDateTime) -> Result<Vec<PageMetadata>, WikiError> {
        let state = self.state();
        state.check(path)?;
        Ok(state.metadata(path, |c| c.date > since))
    }

    fn abs_path(&self, path: &str) -> PathBuf {
        PathBuf::from(ROOT).join(path)
    }

    async fn exists(&self, path: &str) -> Result<bool, WikiError> {
        let state = self.state();
        Ok(state.worktree.contains_key(path) || state.dirs.contains(path))
    }

    async fn create_dir(&self, path: &str) -> Result<(), WikiError> {
        let mut state = self.state();
        let raced = state.racing_dirs.remove(path);
        state.dirs.insert(path.to_string());
        if raced {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "created concurrently").into());
        }
        Ok(())
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), WikiError> {
        self.state().worktree.insert(path.to_string(), content.to_string());
        Ok(())
    }
}
