use axum::{
    extract::{Path as AxumPath, RawQuery, State},
    response::Html,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::errors::WikiError;
use crate::services::MarkdownService;
use crate::templates::render_shell;
use crate::types::{AppState, PageMetadata};
use crate::utils::{escape_attr, escape_html, parse_query_param};

fn page(state: &AppState, title: &str, body: &str) -> Html<String> {
    Html(render_shell(&state.static_dir, title, body))
}

fn metadata_rows(entries: &[PageMetadata]) -> String {
    let mut html = String::from("<table class=\"history\">");
    for m in entries {
        html.push_str(&format!(
            "<tr><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&m.hash_ref),
            escape_html(&m.author),
            m.date.format(&Rfc3339).unwrap_or_default(),
            escape_html(&m.comment)
        ));
    }
    html.push_str("</table>");
    html
}

/// List top-level wiki directories
pub async fn handle_root(State(state): State<AppState>) -> Result<Html<String>, WikiError> {
    let dirs = state.wiki.directories().await?;
    let mut html = String::from("<h1>Wiki</h1><ul class=\"dir-list\">");
    for dir in &dirs {
        html.push_str(&format!(
            "<li><a href=\"/wiki/{}\">{}</a></li>",
            escape_attr(dir),
            escape_html(dir)
        ));
    }
    html.push_str("</ul>");
    Ok(page(&state, "Wiki", &html))
}

/// Pages of a directory and its recently changed files
pub async fn handle_dir(
    State(state): State<AppState>,
    AxumPath(dir): AxumPath<String>,
) -> Result<Html<String>, WikiError> {
    log::info!("Directory request received: '{}'", dir);
    let pages = state.wiki.page_list(&dir).await?;
    let changed = state.wiki.list_changed_files_in_directory(&dir).await?;

    let mut html = format!("<h1>{}</h1><ul class=\"page-list\">", escape_html(&dir));
    for entry in &pages {
        html.push_str(&format!(
            "<li><a href=\"/wiki/{}\">{}</a></li>",
            escape_attr(&entry.full_name),
            escape_html(&entry.name)
        ));
    }
    html.push_str("</ul><h2>Recent changes</h2>");
    html.push_str(&metadata_rows(&changed));
    Ok(page(&state, &dir, &html))
}

/// Rendered page, optionally at `?version=<revision>`
pub async fn handle_page(
    State(state): State<AppState>,
    AxumPath((dir, name)): AxumPath<(String, String)>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, WikiError> {
    let full_name = format!("{}/{}", dir, name);
    let version = query
        .as_deref()
        .map(|q| parse_query_param(q, "version"))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "HEAD".to_string());
    log::info!("Page request received: '{}' at {}", full_name, version);

    let content = state.wiki.show_page(&full_name, &version).await?;
    let result = MarkdownService::new().render_with_toc(&content);
    let title = result.title.clone().unwrap_or_else(|| name.clone());
    let body = format!("{}{}", result.toc, result.html);
    Ok(page(&state, &title, &body))
}

pub async fn handle_history(
    State(state): State<AppState>,
    AxumPath((dir, name)): AxumPath<(String, String)>,
) -> Result<Html<String>, WikiError> {
    let full_name = format!("{}/{}", dir, name);
    let history = state.wiki.page_history(&full_name).await?;
    let html = format!("<h1>History of {}</h1>{}", escape_html(&full_name), metadata_rows(&history));
    Ok(page(&state, &full_name, &html))
}

pub async fn handle_compare(
    State(state): State<AppState>,
    AxumPath((dir, name, revisions)): AxumPath<(String, String, String)>,
) -> Result<Html<String>, WikiError> {
    let full_name = format!("{}/{}", dir, name);
    let diff = state.wiki.page_compare(&full_name, &revisions).await?;
    let html = format!(
        "<h1>{} ({})</h1><p>+{} / -{}</p>{}",
        escape_html(&full_name),
        escape_html(&revisions),
        diff.added(),
        diff.removed(),
        diff.as_html()
    );
    Ok(page(&state, &full_name, &html))
}

/// Handle search requests
pub async fn handle_search(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, WikiError> {
    let text = query.as_deref().map(|q| parse_query_param(q, "q")).unwrap_or_default();
    let matches = state.wiki.search(&text).await?;

    let mut html = format!(
        "<h1>Search</h1><p>{} results for \"{}\"</p><ul class=\"search-results\">",
        matches.len(),
        escape_html(&text)
    );
    for m in &matches {
        html.push_str(&format!(
            "<li><a href=\"/wiki/{}\">{}</a> <span class=\"line\">{}</span> {}</li>",
            escape_attr(&m.page_name),
            escape_html(&m.page_name),
            escape_html(&m.line),
            escape_html(&m.text)
        ));
    }
    html.push_str("</ul>");
    Ok(page(&state, "Search", &html))
}

pub async fn handle_blog(
    State(state): State<AppState>,
    AxumPath(group): AxumPath<String>,
) -> Result<Html<String>, WikiError> {
    let posts = state.blog.blogposts_for_group(&group).await?;
    let markdown = MarkdownService::new();

    let mut html = format!("<h1>Blog of {}</h1>", escape_html(&group));
    for post in &posts {
        html.push_str(&format!(
            "<article><h2><a href=\"{}\">{}</a></h2><p class=\"meta\">{}</p>{}</article>",
            escape_attr(&post.url()),
            escape_html(&post.title),
            post.date(),
            post.teaser.as_deref().map(|t| markdown.render_fragment(t)).unwrap_or_default()
        ));
    }
    Ok(page(&state, &group, &html))
}

/// Changes since `?since=<RFC 3339>`, defaulting to the last week
pub async fn handle_digest(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, WikiError> {
    let since = query.as_deref().map(|q| parse_query_param(q, "since")).unwrap_or_default();
    let cutoff = if since.is_empty() {
        OffsetDateTime::now_utc() - time::Duration::days(7)
    } else {
        OffsetDateTime::parse(&since, &Rfc3339)?
    };

    let dirs = state.digest.find_pages_for_digest_since(cutoff).await?;
    let mut html = format!("<h1>Changes since {}</h1>", cutoff.format(&Rfc3339)?);
    for dir in &dirs {
        html.push_str(&format!("<section><h2>{}</h2>", escape_html(&dir.dir)));
        for file in &dir.files {
            html.push_str(&format!("<h3>{}</h3>", escape_html(&file.file)));
            html.push_str(&metadata_rows(&file.changelist));
            html.push_str(&file.diff.as_html());
        }
        html.push_str("</section>");
    }
    Ok(page(&state, "Digest", &html))
}
