use std::io;
use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use log::{debug, warn};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tokio::process::Command;

use crate::errors::WikiError;
use crate::types::PageMetadata;
use crate::utils::{matches_pattern, PAGE_EXTENSION};

const RECORD_SEPARATOR: char = '\x1e';
const FIELD_SEPARATOR: char = '\x1f';
const LOG_FORMAT: &str = "--pretty=format:%x1e%h%x1f%H%x1f%an%x1f%aI%x1f%s";

/// Command surface of the version-control backend.
///
/// Paths are relative to the repository root unless noted otherwise.
/// The working-tree helpers at the end exist so that callers never touch
/// the filesystem behind the backend's back.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Content of `path` at `revision`
    async fn read_file(&self, path: &str, revision: &str) -> Result<String, WikiError>;
    /// Up to `limit` revisions of `path` reachable from `revision`, newest first
    async fn log(&self, path: &str, revision: &str, limit: usize) -> Result<Vec<PageMetadata>, WikiError>;
    /// Raw unified diff of `path` over `revisions` (`a..b`)
    async fn diff(&self, path: &str, revisions: &str) -> Result<String, WikiError>;
    /// Page files under `dir`, repository relative
    async fn ls(&self, dir: &str) -> Result<Vec<String>, WikiError>;
    /// Top-level directories
    async fn lsdirs(&self) -> Result<Vec<String>, WikiError>;
    /// Absolute paths of files in `group` whose name matches `pattern`
    async fn ls_blogposts(&self, group: &str, pattern: &str) -> Result<Vec<String>, WikiError>;
    /// Read a file by absolute path from the working tree
    async fn read_file_fs(&self, path: &str) -> Result<String, WikiError>;
    /// `file:line:text` lines matching `text`, plus bare file names matching it
    async fn grep(&self, text: &str) -> Result<Vec<String>, WikiError>;
    async fn mv(&self, old_path: &str, new_path: &str, message: &str, author: &str) -> Result<(), WikiError>;
    /// Stage `path` and commit it
    async fn add(&self, path: &str, message: &str, author: &str) -> Result<(), WikiError>;
    /// Revisions of `path` authored after `since`, newest first
    async fn latest_changes(&self, path: &str, since: OffsetDateTime) -> Result<Vec<PageMetadata>, WikiError>;

    fn abs_path(&self, path: &str) -> PathBuf;

    async fn exists(&self, path: &str) -> Result<bool, WikiError>;
    /// Create a single directory; fails with `AlreadyExists` if present
    async fn create_dir(&self, path: &str) -> Result<(), WikiError>;
    async fn write_file(&self, path: &str, content: &str) -> Result<(), WikiError>;
}

/// [`VersionControl`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitGateway {
    root: PathBuf,
    git: String,
}

impl GitGateway {
    pub fn new(root: PathBuf) -> Self {
        Self::with_binary(root, "git")
    }

    pub fn with_binary(root: PathBuf, git: impl Into<String>) -> Self {
        let git = git.into();
        debug!("Creating GitGateway for {:?} using {}", root, git);
        Self { root, git }
    }

    async fn exec(&self, args: &[&str]) -> Result<Output, WikiError> {
        debug!("git {}", args.join(" "));
        Command::new(&self.git)
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
            .map_err(|e| WikiError::gateway(args.join(" "), e.to_string()))
    }

    /// Run git and return stdout, failing on any non-zero exit
    async fn run(&self, args: &[&str]) -> Result<String, WikiError> {
        let output = self.exec(args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(failure(args, &output))
        }
    }

    /// Like [`run`](Self::run) but an empty repository yields empty output
    async fn run_on_history(&self, args: &[&str]) -> Result<String, WikiError> {
        let output = self.exec(args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_unborn_head(&stderr) {
            debug!("Repository has no commits yet, treating git {} as empty", args.join(" "));
            return Ok(String::new());
        }
        Err(failure(args, &output))
    }

    async fn commit(&self, message: &str, author: &str, paths: &[&str]) -> Result<(), WikiError> {
        let author_arg = format!("--author={}", author);
        let mut args = vec!["commit", author_arg.as_str(), "-m", message, "--"];
        args.extend_from_slice(paths);
        self.run(&args).await.map(|_| ())
    }
}

#[async_trait]
impl VersionControl for GitGateway {
    async fn read_file(&self, path: &str, revision: &str) -> Result<String, WikiError> {
        let object = format!("{}:{}", revision, path);
        let args = ["show", "--end-of-options", object.as_str()];
        let output = self.exec(&args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_object(&stderr) {
            Err(WikiError::NotFound(object))
        } else {
            Err(failure(&args, &output))
        }
    }

    async fn log(&self, path: &str, revision: &str, limit: usize) -> Result<Vec<PageMetadata>, WikiError> {
        let limit = limit.to_string();
        let mut args = vec!["log", "-n", limit.as_str(), "--no-notes", "--name-only", LOG_FORMAT];
        if path.ends_with(PAGE_EXTENSION) {
            args.push("--follow");
        }
        args.extend_from_slice(&[revision, "--", path]);
        let raw = self.run_on_history(&args).await?;
        parse_log(&raw, path)
    }

    async fn diff(&self, path: &str, revisions: &str) -> Result<String, WikiError> {
        self.run(&["diff", "--no-color", "--end-of-options", revisions, "--", path]).await
    }

    async fn ls(&self, dir: &str) -> Result<Vec<String>, WikiError> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let raw = self
            .run_on_history(&["ls-tree", "--name-only", "-r", "HEAD", "--", prefix.as_str()])
            .await?;
        Ok(raw
            .lines()
            .filter(|line| line.ends_with(PAGE_EXTENSION))
            .map(str::to_string)
            .collect())
    }

    async fn lsdirs(&self) -> Result<Vec<String>, WikiError> {
        let raw = self.run_on_history(&["ls-tree", "--name-only", "-d", "HEAD"]).await?;
        Ok(raw
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('.'))
            .map(str::to_string)
            .collect())
    }

    async fn ls_blogposts(&self, group: &str, pattern: &str) -> Result<Vec<String>, WikiError> {
        let dir = self.abs_path(group);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No directory for group {}", group);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut posts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if matches_pattern(&name, pattern) {
                posts.push(entry.path().to_string_lossy().into_owned());
            }
        }
        posts.sort();
        Ok(posts)
    }

    async fn read_file_fs(&self, path: &str) -> Result<String, WikiError> {
        tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WikiError::NotFound(path.to_string()),
            _ => WikiError::Io(e),
        })
    }

    async fn grep(&self, text: &str) -> Result<Vec<String>, WikiError> {
        let args = ["grep", "--no-color", "-F", "-n", "-i", "-I", "-e", text];
        let output = self.exec(&args).await?;
        // exit code 1 means nothing matched
        let mut lines: Vec<String> = match output.status.code() {
            Some(0) => String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect(),
            Some(1) if output.stderr.is_empty() => Vec::new(),
            _ => return Err(failure(&args, &output)),
        };

        let name_pattern = format!(":(icase)*{}*{}", text, PAGE_EXTENSION);
        match self.run(&["ls-files", "--", name_pattern.as_str()]).await {
            Ok(names) => lines.extend(names.lines().map(str::to_string)),
            Err(e) => warn!("File name search for '{}' failed: {}", text, e),
        }
        Ok(lines)
    }

    async fn mv(&self, old_path: &str, new_path: &str, message: &str, author: &str) -> Result<(), WikiError> {
        self.run(&["mv", old_path, new_path]).await?;
        self.commit(message, author, &[old_path, new_path]).await
    }

    async fn add(&self, path: &str, message: &str, author: &str) -> Result<(), WikiError> {
        self.run(&["add", "--", path]).await?;
        self.commit(message, author, &[path]).await
    }

    async fn latest_changes(&self, path: &str, since: OffsetDateTime) -> Result<Vec<PageMetadata>, WikiError> {
        let since = format!("--since={}", git_timestamp(since)?);
        let raw = self
            .run_on_history(&["log", since.as_str(), "--no-notes", "--name-only", LOG_FORMAT, "HEAD", "--", path])
            .await?;
        parse_log(&raw, path)
    }

    fn abs_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn exists(&self, path: &str) -> Result<bool, WikiError> {
        Ok(tokio::fs::try_exists(self.abs_path(path)).await?)
    }

    async fn create_dir(&self, path: &str) -> Result<(), WikiError> {
        Ok(tokio::fs::create_dir(self.abs_path(path)).await?)
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), WikiError> {
        Ok(tokio::fs::write(self.abs_path(path), content).await?)
    }
}

/// Timestamp in the `YYYY-MM-DD hh:mm:ss +0000` form git prints and parses
pub fn git_timestamp(at: OffsetDateTime) -> Result<String, WikiError> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] +0000");
    Ok(at.to_offset(UtcOffset::UTC).format(format)?)
}

fn failure(args: &[&str], output: &Output) -> WikiError {
    WikiError::gateway(args.join(" "), String::from_utf8_lossy(&output.stderr))
}

fn is_missing_object(stderr: &str) -> bool {
    stderr.contains("does not exist")
        || stderr.contains("exists on disk, but not in")
        || stderr.contains("invalid object name")
        || stderr.contains("bad revision")
        || is_unborn_head(stderr)
}

fn is_unborn_head(stderr: &str) -> bool {
    stderr.contains("does not have any commits yet")
        || stderr.contains("ambiguous argument 'HEAD'")
        || stderr.contains("Not a valid object name HEAD")
}

/// Parse `git log` output produced with [`LOG_FORMAT`] and `--name-only`.
/// Records without a file list are attributed to `path`.
pub(crate) fn parse_log(raw: &str, path: &str) -> Result<Vec<PageMetadata>, WikiError> {
    let mut entries = Vec::new();
    for record in raw.split(RECORD_SEPARATOR).filter(|r| !r.trim().is_empty()) {
        let mut lines = record.lines();
        let header = lines.next().unwrap_or("");
        let fields: Vec<&str> = header.splitn(5, FIELD_SEPARATOR).collect();
        let &[hash_ref, fullhash, author, date, comment] = fields.as_slice() else {
            return Err(WikiError::Validation(format!("unexpected git log record: {:?}", header)));
        };
        let name = lines
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or(path)
            .to_string();
        entries.push(PageMetadata {
            name,
            hash_ref: hash_ref.to_string(),
            fullhash: fullhash.to_string(),
            author: author.to_string(),
            date: OffsetDateTime::parse(date, &Rfc3339)?,
            comment: comment.to_string(),
        });
    }
    Ok(entries)
}
