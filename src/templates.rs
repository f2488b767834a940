use std::fs;
use std::path::Path;

use crate::utils::escape_html;

/// Wrap `content` in the site shell, preferring `static/html/base.html`
pub fn render_shell(static_dir: &Path, title: &str, content: &str) -> String {
    let base_path = static_dir.join("html/base.html");
    if let Ok(base) = fs::read_to_string(&base_path) {
        return base
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{STYLE}}", "<link rel=\"stylesheet\" href=\"/static/css/agora.css\">")
            .replace("{{CONTENT}}", content);
    }

    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>{}</title><link rel=\"stylesheet\" href=\"/static/css/agora.css\"></head><body><main class=\"content\"><div class=\"article-card\">{}</div></main></body></html>",
        escape_html(title),
        content
    )
}
