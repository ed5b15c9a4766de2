//! Stack visualization: the markdown table synced onto every PR in a stack,
//! keeping a single bot-authored comment per PR. Defends against
//! markdown/HTML injection via attacker-controlled commit titles.

use crate::host::PrState;
use crate::stack_context::StackContext;

pub const STACK_START: &str = "<!-- stack:viz:start -->";
pub const STACK_END: &str = "<!-- stack:viz:end -->";

const NBSP: char = '\u{00A0}';

/// Check if a string (commit title, in our case, rather than a branch name)
/// contains patterns that could enable markdown/HTML injection once
/// embedded verbatim in a PR comment.
pub fn is_dangerous_text(name: &str) -> bool {
    name.contains("](http")
        || name.contains("](https")
        || name.contains("](javascript")
        || name.contains("](file")
        || name.contains("](data")
        || name.contains("![")
        || name.contains("```")
        || name.contains("<!--")
        || name.contains("-->")
        || name.contains("<script")
        || name.contains("<img")
        || name.contains("<iframe")
        || name.contains("<object")
        || name.contains("<embed")
        || name.contains("<svg")
        || name.contains("<a ")
        || name.contains("<a>")
        || name.to_lowercase().contains("onerror")
        || name.to_lowercase().contains("onload")
        || name.to_lowercase().contains("onclick")
        || name.chars().any(|c| {
            matches!(c,
                '\u{200B}'..='\u{200F}' |
                '\u{202A}'..='\u{202E}' |
                '\u{2066}'..='\u{2069}' |
                '\u{FEFF}'
            )
        })
}

fn sanitize(text: &str) -> String {
    if is_dangerous_text(text) {
        text.chars().filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "-_.,:;!?()".contains(*c)).collect()
    } else {
        text.to_string()
    }
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    let char_count = title.chars().count();
    if char_count <= max_chars {
        title.to_string()
    } else {
        let truncated: String = title.chars().take(max_chars - 1).collect();
        format!("{truncated}…")
    }
}

fn status_text(state: Option<PrState>) -> &'static str {
    match state {
        Some(PrState::Draft) => "Draft",
        Some(PrState::Merged) => "Merged",
        Some(PrState::Closed) => "Closed",
        Some(PrState::Open) | None => "Open",
    }
}

/// Render the stack-wide visualization table. The same body is sent to
/// every active PR; only the in-place `▶` marker differs by recipient, so
/// callers pass the recipient's UUID to highlight its row.
pub fn render_for(ctx: &StackContext, current: Option<&crate::identity::Uuid16>) -> String {
    if ctx.all_changes.is_empty() {
        return String::new();
    }

    let current_pos = current
        .and_then(|uuid| ctx.active_index(uuid))
        .map(|i| i + 1)
        .unwrap_or(ctx.active_changes.len().max(1));
    let total = ctx.active_changes.len().max(1);

    let mut lines = vec![
        STACK_START.to_string(),
        format!("<details>\n<summary>Stack ({current_pos} of {total})</summary>"),
        String::new(),
        "| # | Title | Status |".to_string(),
        "|:---|:---|:---:|".to_string(),
    ];

    for change in &ctx.all_changes {
        let is_current = current.is_some_and(|uuid| uuid == &change.uuid);
        let is_inactive = change.is_merged() || change.pr.as_ref().is_some_and(|p| p.state == PrState::Closed);

        let marker = if is_current { "▶" } else { "" };
        let title = truncate_title(&sanitize(&change.title), 60);

        let pr_cell = match &change.pr {
            Some(pr) => format!("[#{}]({})", pr.number, pr.url),
            None => "(not pushed)".to_string(),
        };
        let status = status_text(change.pr.as_ref().map(|p| p.state));

        let (num_cell, title_cell, status_cell) = if is_inactive {
            (format!("{marker}{NBSP}~~{pr_cell}~~"), format!("~~{title}~~"), format!("~~{status}~~"))
        } else if is_current {
            (format!("{marker}{NBSP}**{pr_cell}**"), format!("**{title}**"), format!("**{status}**"))
        } else {
            (pr_cell, title, status.to_string())
        };

        lines.push(format!("| {num_cell} | {title_cell} | {status_cell} |"));
    }

    lines.push(String::new());
    lines.push("</details>".to_string());
    lines.push(STACK_END.to_string());
    lines.join("\n")
}

/// Convenience wrapper for callers (the push engine) that send an identical
/// body to every PR without per-recipient highlighting.
pub fn render(ctx: &StackContext) -> String {
    render_for(ctx, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_dangerous_text_flags_injection_patterns() {
        assert!(is_dangerous_text("fix](http://evil.com)"));
        assert!(is_dangerous_text("drop <script>alert(1)</script>"));
        assert!(!is_dangerous_text("Fix login bug"));
    }

    #[test]
    fn sanitize_strips_dangerous_characters_only_when_flagged() {
        assert_eq!(sanitize("Normal title"), "Normal title");
        let sanitized = sanitize("evil](javascript:alert(1))");
        assert!(!sanitized.contains("]("));
    }
}
