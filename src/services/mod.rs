pub mod git_gateway;
pub mod diff;
pub mod wiki_service;
pub mod search_service;
pub mod blog_service;
pub mod digest_service;
pub mod markdown_service;

#[cfg(test)]
pub(crate) mod testing;

pub use git_gateway::{GitGateway, VersionControl};
pub use diff::Diff;
pub use wiki_service::WikiService;
pub use search_service::SearchService;
pub use blog_service::BlogService;
pub use digest_service::DigestService;
pub use markdown_service::MarkdownService;
