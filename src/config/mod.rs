use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::WikiError;

/// Application configuration and constants
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the git working tree holding the wiki pages
    pub repo_dir: Arc<PathBuf>,
    pub static_dir: Arc<PathBuf>,
    pub port: u16,
    pub host: String,
    pub git_binary: String,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            repo_dir: Arc::new(PathBuf::from("wiki")),
            static_dir: Arc::new(PathBuf::from("static")),
            port: 5004,
            host: "0.0.0.0".to_string(),
            git_binary: "git".to_string(),
        }
    }

    /// Read overrides from `AGORA_WIKI_DIR`, `AGORA_HOST`, `AGORA_PORT` and `AGORA_GIT`
    pub fn from_env() -> Result<Self, WikiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WikiError> {
        let mut config = Self::new();
        if let Some(dir) = lookup("AGORA_WIKI_DIR") {
            config.repo_dir = Arc::new(PathBuf::from(dir));
        }
        if let Some(host) = lookup("AGORA_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("AGORA_PORT") {
            config.port = port
                .parse()
                .map_err(|_| WikiError::Validation(format!("AGORA_PORT is not a port number: {}", port)))?;
        }
        if let Some(git) = lookup("AGORA_GIT") {
            config.git_binary = git;
        }
        Ok(config)
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, WikiError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| WikiError::Validation(format!("cannot bind to {}:{}", self.host, self.port)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
