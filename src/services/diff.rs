use crate::utils::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub old_number: Option<u32>,
    pub new_number: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// The `@@ -a,b +c,d @@ ...` line
    pub header: String,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
}

/// Parsed `git diff` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse unified diff text; lines outside of any file or hunk are ignored
    pub fn parse(raw: &str) -> Self {
        let mut files: Vec<FileDiff> = Vec::new();
        let mut old_line = 0u32;
        let mut new_line = 0u32;

        for line in raw.lines() {
            if let Some(rest) = line.strip_prefix("diff --git ") {
                let (old_path, new_path) = split_git_paths(rest);
                files.push(FileDiff { old_path, new_path, hunks: Vec::new() });
                continue;
            }
            let Some(file) = files.last_mut() else { continue };

            if line.starts_with("@@") {
                let (o, n) = hunk_starts(line);
                old_line = o;
                new_line = n;
                file.hunks.push(Hunk { header: line.to_string(), lines: Vec::new() });
                continue;
            }

            let Some(hunk) = file.hunks.last_mut() else {
                // file header lines between `diff --git` and the first hunk
                if let Some(path) = line.strip_prefix("--- ") {
                    file.old_path = strip_side(path);
                } else if let Some(path) = line.strip_prefix("+++ ") {
                    file.new_path = strip_side(path);
                }
                continue;
            };

            let (kind, text) = match line.chars().next() {
                Some('+') => (LineKind::Added, &line[1..]),
                Some('-') => (LineKind::Removed, &line[1..]),
                Some(' ') => (LineKind::Context, &line[1..]),
                Some('\\') => continue,
                None => (LineKind::Context, ""),
                _ => continue,
            };
            let (old_number, new_number) = match kind {
                LineKind::Added => {
                    new_line += 1;
                    (None, Some(new_line - 1))
                }
                LineKind::Removed => {
                    old_line += 1;
                    (Some(old_line - 1), None)
                }
                LineKind::Context => {
                    old_line += 1;
                    new_line += 1;
                    (Some(old_line - 1), Some(new_line - 1))
                }
            };
            hunk.lines.push(DiffLine { kind, old_number, new_number, text: text.to_string() });
        }

        Diff { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|f| f.hunks.is_empty())
    }

    fn count(&self, kind: LineKind) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.hunks)
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == kind)
            .count()
    }

    pub fn added(&self) -> usize {
        self.count(LineKind::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineKind::Removed)
    }

    /// Render as a side-numbered HTML table per file
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        for file in &self.files {
            html.push_str("<div class=\"diff-file\">");
            html.push_str(&format!("<div class=\"diff-file-name\">{}</div>", escape_html(&file.new_path)));
            html.push_str("<table class=\"diff\">");
            for hunk in &file.hunks {
                html.push_str(&format!(
                    "<tr class=\"diff-hunk\"><td colspan=\"3\">{}</td></tr>",
                    escape_html(&hunk.header)
                ));
                for line in &hunk.lines {
                    let class = match line.kind {
                        LineKind::Context => "diff-context",
                        LineKind::Added => "diff-added",
                        LineKind::Removed => "diff-removed",
                    };
                    html.push_str(&format!(
                        "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>",
                        class,
                        line.old_number.map(|n| n.to_string()).unwrap_or_default(),
                        line.new_number.map(|n| n.to_string()).unwrap_or_default(),
                        escape_html(&line.text)
                    ));
                }
            }
            html.push_str("</table></div>");
        }
        html
    }
}

fn split_git_paths(rest: &str) -> (String, String) {
    match rest.split_once(" b/") {
        Some((old, new)) => (old.trim_start_matches("a/").to_string(), new.to_string()),
        None => (rest.to_string(), rest.to_string()),
    }
}

fn strip_side(path: &str) -> String {
    let path = path.trim_end();
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

/// Start lines from `@@ -12,3 +12,4 @@`; a missing number counts as 1
fn hunk_starts(header: &str) -> (u32, u32) {
    let mut old = 1;
    let mut new = 1;
    for token in header.split_whitespace().skip(1) {
        let start = |t: &str| t.split(',').next().and_then(|n| n.parse().ok()).unwrap_or(1);
        if let Some(range) = token.strip_prefix('-') {
            old = start(range);
        } else if let Some(range) = token.strip_prefix('+') {
            new = start(range);
        } else {
            break;
        }
    }
    (old, new)
}
