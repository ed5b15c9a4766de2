//! Branch-name grammar for stack and UUID branches.
//!
//! Pattern: `<username>/stack-<name>/<suffix>` where suffix is either `TOP`
//! (the canonical stack branch) or a 16-hex-char UUID (a per-change tracking
//! branch). Parsing splits on the final `/` so that stack names themselves
//! may contain `/`.

use crate::error::StackError;

const STACK_INFIX: &str = "/stack-";
const TOP_SUFFIX: &str = "TOP";

/// The classification of a branch name under the stack grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchKind {
    /// `<username>/stack-<name>/TOP`
    Stack { username: String, stack_name: String },
    /// `<username>/stack-<name>/<uuid>`
    Uuid {
        username: String,
        stack_name: String,
        uuid: String,
    },
}

/// Parse an arbitrary branch name under the stack grammar.
///
/// Returns `None` if the branch doesn't match `<user>/stack-<name>/<suffix>`
/// at all (too few parts, missing `stack-` prefix). A name that has the
/// right shape but an invalid suffix (neither `TOP` nor 16 hex chars) is
/// also `None` — the grammar has no "malformed UUID branch" variant.
pub fn classify(branch: &str) -> Option<BranchKind> {
    let (head, suffix) = branch.rsplit_once('/')?;
    let (username, stack_part) = head.split_once(STACK_INFIX)?;
    if username.is_empty() || stack_part.is_empty() {
        return None;
    }

    if suffix == TOP_SUFFIX {
        return Some(BranchKind::Stack {
            username: username.to_string(),
            stack_name: stack_part.to_string(),
        });
    }

    if is_uuid16(suffix) {
        return Some(BranchKind::Uuid {
            username: username.to_string(),
            stack_name: stack_part.to_string(),
            uuid: suffix.to_lowercase(),
        });
    }

    None
}

/// `true` iff `branch` is a stack's TOP branch.
pub fn is_stack_branch(branch: &str) -> bool {
    matches!(classify(branch), Some(BranchKind::Stack { .. }))
}

/// `true` iff `branch` is a per-change UUID tracking branch.
pub fn is_uuid_branch(branch: &str) -> bool {
    matches!(classify(branch), Some(BranchKind::Uuid { .. }))
}

/// Extract the stack name from any branch matching the grammar.
pub fn extract_stack_name(branch: &str) -> Option<String> {
    match classify(branch)? {
        BranchKind::Stack { stack_name, .. } => Some(stack_name),
        BranchKind::Uuid { stack_name, .. } => Some(stack_name),
    }
}

/// Extract the UUID suffix from a UUID branch, `None` for anything else.
pub fn extract_uuid(branch: &str) -> Option<String> {
    match classify(branch)? {
        BranchKind::Uuid { uuid, .. } => Some(uuid),
        BranchKind::Stack { .. } => None,
    }
}

/// Format the TOP branch name for `(username, stack_name)`.
pub fn format_stack_branch(username: &str, stack_name: &str) -> String {
    format!("{username}{STACK_INFIX}{stack_name}/{TOP_SUFFIX}")
}

/// Format a UUID branch name for `(username, stack_name, uuid)`.
pub fn format_uuid_branch(username: &str, stack_name: &str, uuid: &str) -> String {
    format!("{username}{STACK_INFIX}{stack_name}/{uuid}")
}

/// `true` iff `s` is exactly 16 lowercase-or-uppercase hex characters.
pub fn is_uuid16(s: &str) -> bool {
    s.len() == 16 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a user-supplied stack name: non-empty, no `/`, no whitespace.
///
/// Stack names are embedded directly into branch names (`stack-<name>`), so
/// they must stay ref-name-safe; we reject the characters git itself
/// forbids in ref components plus `/` (which would break suffix parsing).
pub fn validate_stack_name(name: &str) -> Result<(), StackError> {
    if name.is_empty() {
        return Err(StackError::InvalidName {
            name: name.to_string(),
            reason: "stack name must not be empty",
        });
    }
    let forbidden = ['/', ' ', '\t', '\n', '~', '^', ':', '?', '*', '[', '\\'];
    if name.chars().any(|c| forbidden.contains(&c)) {
        return Err(StackError::InvalidName {
            name: name.to_string(),
            reason: "stack name contains a character not allowed in a git ref component",
        });
    }
    if name.starts_with('-') || name.starts_with('.') || name.ends_with('.') {
        return Err(StackError::InvalidName {
            name: name.to_string(),
            reason: "stack name must not start with '-' or '.', or end with '.'",
        });
    }
    Ok(())
}

/// Turn free text (e.g. a commit title) into a ref-safe slug.
///
/// Lowercases, replaces runs of non-alphanumeric characters with `-`, and
/// trims leading/trailing `-`. Used by `new`/`create`-style commands when a
/// branch name wasn't given explicitly.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_stack_branch() {
        let branch = format_stack_branch("alice", "feat");
        assert_eq!(branch, "alice/stack-feat/TOP");
        assert_eq!(
            classify(&branch),
            Some(BranchKind::Stack {
                username: "alice".into(),
                stack_name: "feat".into()
            })
        );
        assert!(is_stack_branch(&branch));
        assert!(!is_uuid_branch(&branch));
        assert_eq!(extract_stack_name(&branch), Some("feat".to_string()));
        assert_eq!(extract_uuid(&branch), None);
    }

    #[test]
    fn round_trips_uuid_branch() {
        let branch = format_uuid_branch("alice", "feat", "0123456789abcdef");
        assert_eq!(branch, "alice/stack-feat/0123456789abcdef");
        assert!(is_uuid_branch(&branch));
        assert_eq!(extract_uuid(&branch), Some("0123456789abcdef".to_string()));
        assert_eq!(extract_stack_name(&branch), Some("feat".to_string()));
    }

    #[test]
    fn stack_name_with_slash() {
        // stack names may contain '/'; the grammar splits on the *final* slash.
        let branch = format_stack_branch("alice", "team/feat");
        assert_eq!(branch, "alice/stack-team/feat/TOP");
        assert_eq!(extract_stack_name(&branch), Some("team/feat".to_string()));
    }

    #[test]
    fn rejects_malformed_inputs() {
        assert_eq!(classify("feature"), None);
        assert_eq!(classify("alice/feat/TOP"), None); // missing "stack-" prefix
        assert_eq!(classify("alice/stack-feat/nothex"), None);
        assert_eq!(classify("alice/stack-feat/deadbeefdeadbee"), None); // 15 chars
        assert_eq!(classify("alice/stack-/TOP"), None); // empty stack name
    }

    #[test]
    fn uuid16_validation() {
        assert!(is_uuid16("0123456789abcdef"));
        assert!(is_uuid16("0123456789ABCDEF"));
        assert!(!is_uuid16("0123456789abcde")); // 15 chars
        assert!(!is_uuid16("0123456789abcdeg")); // non-hex
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Fix the Login Bug!!"), "fix-the-login-bug");
        assert_eq!(slugify("  leading/trailing  "), "leading-trailing");
    }

    #[test]
    fn stack_name_validation() {
        assert!(validate_stack_name("feat").is_ok());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name("has space").is_err());
        assert!(validate_stack_name("has/slash").is_err());
        assert!(validate_stack_name("-leading-dash").is_err());
    }
}
