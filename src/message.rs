//! Commit-message model: parse a message into title/body/trailers, and
//! render it back.
//!
//! Trailers are recognized the way `git interpret-trailers` does for the
//! common case: a contiguous block of `Key: Value` lines at the very end of
//! the message, separated from the body by a blank line. Keys never contain
//! spaces.

use std::collections::BTreeMap;
use std::collections::HashMap;

/// `PR-UUID` trailer key.
pub const TRAILER_UUID: &str = "PR-UUID";
/// `PR-Stack` trailer key.
pub const TRAILER_STACK: &str = "PR-Stack";

/// A parsed commit message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
    pub trailers: Trailers,
}

/// An ordered map of trailer key/value pairs.
///
/// Iteration order is insertion order (stable for testability); semantics
/// never depend on order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailers {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl Trailers {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a trailer, overwriting any existing value for `key` in place.
    /// New keys are appended to the end.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.values.insert(key.to_string(), value).is_none() {
            self.order.push(key.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(move |k| (k.as_str(), self.values[k].as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Map keyed by key, for callers that don't need order (e.g. tests).
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.values.clone().into_iter().collect()
    }
}

impl Message {
    pub fn add_trailer(&mut self, key: &str, value: impl Into<String>) {
        self.trailers.set(key, value);
    }

    pub fn uuid(&self) -> Option<&str> {
        self.trailers.get(TRAILER_UUID)
    }

    pub fn stack_name(&self) -> Option<&str> {
        self.trailers.get(TRAILER_STACK)
    }
}

/// Parse a raw commit message into title, body, and trailers.
///
/// The title is the first line, trimmed. The trailer block, if present, is
/// the maximal contiguous run of `Key: Value` lines (no spaces in `Key`) at
/// the end of the message, provided it is preceded by a blank line (or is
/// the entire remainder after the title). Everything between title and
/// trailers is the body, trimmed.
pub fn parse(text: &str) -> Message {
    let mut lines: Vec<&str> = text.lines().collect();
    // Drop a single trailing blank line artifact from `lines()` on "a\n\nb\n".
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return Message::default();
    }

    let title = lines.remove(0).trim().to_string();

    // Skip the blank line separating title from body, if present.
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }

    // Scan from the end for a contiguous trailer block.
    let mut trailer_start = lines.len();
    for (idx, line) in lines.iter().enumerate().rev() {
        if is_trailer_line(line) {
            trailer_start = idx;
            continue;
        }
        break;
    }

    // A trailer block must be the whole remainder, or preceded by a blank line.
    let has_trailers = trailer_start < lines.len()
        && (trailer_start == 0 || lines[trailer_start - 1].trim().is_empty());

    let (body_lines, trailer_lines): (&[&str], &[&str]) = if has_trailers {
        let body_end = if trailer_start > 0 { trailer_start - 1 } else { 0 };
        (&lines[..body_end], &lines[trailer_start..])
    } else {
        (&lines[..], &[])
    };

    let mut trailers = Trailers::default();
    for line in trailer_lines {
        if let Some((k, v)) = line.split_once(':') {
            trailers.set(k.trim(), v.trim());
        }
    }

    let body = body_lines.join("\n").trim().to_string();

    Message { title, body, trailers }
}

fn is_trailer_line(line: &str) -> bool {
    match line.split_once(':') {
        Some((key, _)) => !key.is_empty() && !key.contains(' ') && !key.contains('\t'),
        None => false,
    }
}

/// Render a message back to text: title, blank line, body (if any), blank
/// line, trailers.
pub fn render(msg: &Message) -> String {
    let mut out = String::new();
    out.push_str(msg.title.trim());

    if !msg.body.trim().is_empty() {
        out.push_str("\n\n");
        out.push_str(msg.body.trim());
    }

    if !msg.trailers.is_empty() {
        out.push_str("\n\n");
        let rendered: Vec<String> = msg.trailers.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        out.push_str(&rendered.join("\n"));
    }

    out.push('\n');
    out
}

/// Strip comment lines (lines beginning with `comment_char`) the way git
/// does before interpreting a commit message file, e.g. for the
/// `commit-msg` hook after the user's editor has added `;`-prefixed (or
/// whatever `core.commentChar` is) guidance lines.
pub fn strip_comments(text: &str, comment_char: char) -> String {
    text.lines()
        .filter(|line| !line.starts_with(comment_char))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_body_trailers() {
        let m = parse("Add login flow\n\nImplements OAuth.\n\nPR-UUID: 0123456789abcdef\nPR-Stack: feat\n");
        assert_eq!(m.title, "Add login flow");
        assert_eq!(m.body, "Implements OAuth.");
        assert_eq!(m.uuid(), Some("0123456789abcdef"));
        assert_eq!(m.stack_name(), Some("feat"));
    }

    #[test]
    fn parses_title_only() {
        let m = parse("Just a title");
        assert_eq!(m.title, "Just a title");
        assert_eq!(m.body, "");
        assert!(m.trailers.is_empty());
    }

    #[test]
    fn parses_title_and_trailers_no_body() {
        let m = parse("Add login flow\n\nPR-UUID: 0123456789abcdef\n");
        assert_eq!(m.title, "Add login flow");
        assert_eq!(m.body, "");
        assert_eq!(m.uuid(), Some("0123456789abcdef"));
    }

    #[test]
    fn body_text_with_colon_is_not_mistaken_for_trailer_without_blank_line() {
        // "Note: see docs" directly followed by a real trailer block, with no
        // blank line between, should NOT be split into body/trailer — the
        // whole thing is one contiguous block, so it's treated as trailers.
        // This matches the documented "maximal contiguous run" behavior.
        let m = parse("Title\n\nNote: see docs\nPR-UUID: 0123456789abcdef\n");
        assert_eq!(m.trailers.get("Note"), Some("see docs"));
        assert_eq!(m.uuid(), Some("0123456789abcdef"));
    }

    #[test]
    fn round_trip_render_parse() {
        let mut m = Message {
            title: "Add login flow".to_string(),
            body: "Implements OAuth.".to_string(),
            trailers: Trailers::default(),
        };
        m.add_trailer(TRAILER_UUID, "0123456789abcdef");
        m.add_trailer(TRAILER_STACK, "feat");
        let rendered = render(&m);
        let reparsed = parse(&rendered);
        assert_eq!(reparsed.title, m.title);
        assert_eq!(reparsed.body, m.body);
        assert_eq!(reparsed.uuid(), m.uuid());
        assert_eq!(reparsed.stack_name(), m.stack_name());
    }

    #[test]
    fn add_trailer_overwrites_in_place() {
        let mut t = Trailers::default();
        t.set("PR-UUID", "aaaa");
        t.set("PR-Stack", "feat");
        t.set("PR-UUID", "bbbb");
        let collected: Vec<_> = t.iter().collect();
        assert_eq!(collected, vec![("PR-UUID", "bbbb"), ("PR-Stack", "feat")]);
    }

    #[test]
    fn strip_comments_removes_comment_lines() {
        let text = "Title\n; this is a hint\nBody line\n; another hint";
        assert_eq!(strip_comments(text, ';'), "Title\nBody line");
    }
}
