use std::path::Path;
use time::{Date, Month};

pub const BLOG_ENTRY_PREFIX: &str = "blog_";
pub const BLOG_ENTRY_FILE_PATTERN: &str = "blog_*";

/// A blog entry stored as `<group>/blog_<YYYY-MM-DD>_<slug>.md`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blogpost {
    pub path: String,
    /// File name without `.md`
    pub name: String,
    pub group: String,
    pub title: String,
    pub teaser: Option<String>,
    date: Date,
}

impl Blogpost {
    /// Parse a post, returning `None` when it has no title or no valid date
    pub fn parse(path: &str, content: &str) -> Option<Self> {
        let mut lines = content.lines();
        let title = strip_heading(lines.next().unwrap_or(""));
        let teaser = lines
            .find(|line| !line.trim().is_empty())
            .map(strip_heading);

        let file = Path::new(path);
        let base = file.file_name()?.to_str()?;
        let date = parse_post_date(base.strip_prefix(BLOG_ENTRY_PREFIX)?)?;
        if title.is_empty() {
            return None;
        }

        let name = base.strip_suffix(".md").unwrap_or(base).to_string();
        let group = file
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|g| g.to_str())
            .unwrap_or("")
            .to_string();

        Some(Self { path: path.to_string(), name, group, title, teaser, date })
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn url(&self) -> String {
        format!("/wiki/{}/{}", self.group, self.name)
    }
}

pub fn is_blog_entry(file_name: &str) -> bool {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(BLOG_ENTRY_PREFIX))
}

fn strip_heading(line: &str) -> String {
    line.trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Leading `YYYY-M(M)-D(D)` of a file name
fn parse_post_date(name: &str) -> Option<Date> {
    let mut parts = name.splitn(3, '-');
    let year = parts.next()?;
    let month = parts.next()?;
    let rest = parts.next()?;
    let day_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();

    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !(1..=2).contains(&month.len()) || !(1..=2).contains(&day_len) {
        return None;
    }

    let year: i32 = year.parse().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    let day: u8 = rest[..day_len].parse().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_title_teaser_and_date() {
        let post = Blogpost::parse(
            "/repo/craftsmen/blog_2013-10-1_kickoff.md",
            "## Kickoff\n\n# Our first meeting\nmore text",
        )
        .unwrap();
        assert_eq!(post.title, "Kickoff");
        assert_eq!(post.teaser.as_deref(), Some("Our first meeting"));
        assert_eq!(post.date(), date!(2013 - 10 - 01));
        assert_eq!(post.name, "blog_2013-10-1_kickoff");
        assert_eq!(post.url(), "/wiki/craftsmen/blog_2013-10-1_kickoff");
    }

    #[test]
    fn rejects_missing_title() {
        assert!(Blogpost::parse("g/blog_2014-01-01_x.md", "\nbody").is_none());
        assert!(Blogpost::parse("g/blog_2014-01-01_x.md", "").is_none());
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(Blogpost::parse("g/blog_2014-02-30_x.md", "Title").is_none());
        assert!(Blogpost::parse("g/blog_someday.md", "Title").is_none());
        assert!(Blogpost::parse("g/blog_14-01-01.md", "Title").is_none());
        assert!(Blogpost::parse("g/blog_blog_2014-01-01_x.md", "Title").is_none());
    }

    #[test]
    fn recognises_blog_entries() {
        assert!(is_blog_entry("team/blog_2014-01-01_x.md"));
        assert!(!is_blog_entry("team/notes.md"));
    }
}
