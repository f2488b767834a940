use std::path::{Component, Path};

use crate::errors::WikiError;

/// Extension of every page file in the repository
pub const PAGE_EXTENSION: &str = ".md";

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}

/// Storage path of a page: `dir/name` becomes `dir/name.md`
pub fn page_file(name: &str) -> String {
    format!("{}{}", name, PAGE_EXTENSION)
}

/// Inverse of [`page_file`]; names without the extension are returned as is
pub fn strip_page_extension(file: &str) -> &str {
    file.strip_suffix(PAGE_EXTENSION).unwrap_or(file)
}

/// Reject names that would leave the repository or address nothing
pub fn ensure_safe_name(name: &str) -> Result<(), WikiError> {
    if name.trim().is_empty() {
        return Err(WikiError::Validation("empty page name".to_string()));
    }
    for comp in Path::new(name).components() {
        match comp {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => return Err(WikiError::Validation(format!("illegal page name: {}", name))),
        }
    }
    Ok(())
}

/// Reject revisions git would read as an option
pub fn ensure_safe_revision(revision: &str) -> Result<(), WikiError> {
    if revision.trim().is_empty() {
        return Err(WikiError::Validation("empty revision".to_string()));
    }
    if revision.starts_with('-') || revision.chars().any(char::is_whitespace) {
        return Err(WikiError::Validation(format!("illegal revision: {}", revision)));
    }
    Ok(())
}

/// Glob-style match supporting `*` only
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

/// Parse query parameter with URL decoding
pub fn parse_query_param(query: &str, param: &str) -> String {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == param)
        .map(|(_, value)| percent_decode(value))
        .unwrap_or_default()
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
