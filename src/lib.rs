//! Agora Wiki - the version-controlled wiki of a community site
//!
//! Pages live as Markdown files in a git repository. The services in this
//! crate read, save, rename, diff and search them through a
//! [`VersionControl`] gateway, and build the per-group blog listing and
//! the "what changed since" digest on top of it.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod services;
pub mod templates;
pub mod types;
pub mod utils;

use axum::{routing::get, Router};

// Re-export commonly used items
pub use config::Config;
pub use errors::WikiError;
pub use types::{
    AppState, Blogpost, DirectoryWithChangedFiles, EditablePage, FileWithChangelist, GitAuthor, HistoryEntry,
    Member, PageEntry, PageMetadata, SaveBody, SearchMatch,
};
pub use services::{BlogService, DigestService, Diff, GitGateway, MarkdownService, SearchService, VersionControl, WikiService};

/// HTTP routes over the wiki services
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/search", get(handlers::handle_search))
        .route("/digest", get(handlers::handle_digest))
        .route("/blog/:group", get(handlers::handle_blog))
        .route("/wiki/:dir", get(handlers::handle_dir))
        .route("/wiki/:dir/:page", get(handlers::handle_page))
        .route("/wiki/:dir/:page/history", get(handlers::handle_history))
        .route("/wiki/:dir/:page/compare/:revisions", get(handlers::handle_compare))
        .with_state(state)
}
