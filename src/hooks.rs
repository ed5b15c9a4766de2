//! Git hook installation and callback handlers.
//!
//! Hooks are thin shell scripts that shell back into this binary's hidden
//! subcommands, the way git-branchless's own `githooks(5)` wrappers invoke
//! back into its single binary rather than embedding logic in the script.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::StackError;
use crate::identity::Uuid16;
use crate::message;
use crate::mutate;
use crate::program_name::program_name;
use crate::stack_context::StackContext;
use crate::vcs::Vcs;

const HOOK_NAMES: &[&str] = &["prepare-commit-msg", "commit-msg", "post-commit"];

fn hook_script(hidden_subcommand: &str) -> String {
    let program = program_name();
    format!(
        "#!/bin/sh\n# installed by `{program} install`; do not edit by hand.\nexec {program} {hidden_subcommand} \"$@\"\n"
    )
}

/// Write all three hooks into `<git_dir>/hooks/`, overwriting any existing
/// file previously installed by this program (files without our marker
/// comment are left untouched to avoid clobbering user hooks). Also sets
/// `core.commentChar = ";"` so Markdown in commit templates (headings,
/// lists) doesn't collide with git's default `#` comment prefix.
pub fn install(vcs: &Vcs, git_dir: &Path) -> Result<()> {
    vcs.set_config("core.commentChar", ";")?;

    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir).context("failed to create hooks directory")?;

    for name in HOOK_NAMES {
        let path = hooks_dir.join(name);
        if path.exists() {
            let existing = fs::read_to_string(&path).unwrap_or_default();
            if !existing.contains("installed by `") {
                bail!(
                    "a hook already exists at {:?} that wasn't installed by this program; remove it manually first",
                    path
                );
            }
        }

        let subcommand = format!("hook-{name}");
        let script = hook_script(&subcommand);
        let mut file = fs::File::create(&path).with_context(|| format!("failed to create hook {:?}", path))?;
        file.write_all(script.as_bytes())?;

        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

pub fn uninstall(git_dir: &Path) -> Result<()> {
    let hooks_dir = git_dir.join("hooks");
    for name in HOOK_NAMES {
        let path = hooks_dir.join(name);
        if !path.exists() {
            continue;
        }
        let existing = fs::read_to_string(&path).unwrap_or_default();
        if existing.contains("installed by `") {
            fs::remove_file(&path).with_context(|| format!("failed to remove hook {:?}", path))?;
        }
    }
    Ok(())
}

/// `prepare-commit-msg <file> <source> [<sha>]`: if on a stack/UUID branch
/// and the message lacks PR-UUID, append the identity trailers.
pub fn prepare_commit_msg(vcs: &Vcs, message_file: &Path, source: Option<&str>) -> Result<()> {
    // Never touch merge/squash/template-sourced messages.
    if matches!(source, Some("merge") | Some("squash")) {
        return Ok(());
    }

    let current_branch = vcs.get_current_branch_name().unwrap_or_default();
    let Some(kind) = crate::branch_name::classify(&current_branch) else {
        return Ok(());
    };

    let stack_name = match kind {
        crate::branch_name::BranchKind::Stack { stack_name, .. } => stack_name,
        crate::branch_name::BranchKind::Uuid { stack_name, .. } => stack_name,
    };

    let raw = fs::read_to_string(message_file).context("failed to read commit message file")?;
    let mut parsed = message::parse(&raw);

    if parsed.uuid().is_some() {
        return Ok(());
    }

    let uuid = Uuid16::generate();
    parsed.add_trailer(message::TRAILER_UUID, uuid.as_str());
    parsed.add_trailer(message::TRAILER_STACK, &stack_name);

    fs::write(message_file, message::render(&parsed)).context("failed to write commit message file")?;
    Ok(())
}

/// Read `core.commentChar` (default `#`, matching git's own default).
fn comment_char(vcs: &Vcs) -> char {
    vcs.get_config("core.commentChar")
        .ok()
        .flatten()
        .and_then(|s| s.trim().chars().next())
        .unwrap_or('#')
}

/// `commit-msg <file>`: block the commit if required trailers are absent
/// or the title is empty, after stripping comment lines.
pub fn commit_msg(vcs: &Vcs, message_file: &Path) -> Result<()> {
    let current_branch = vcs.get_current_branch_name().unwrap_or_default();
    if crate::branch_name::classify(&current_branch).is_none() {
        return Ok(());
    }

    let raw = fs::read_to_string(message_file).context("failed to read commit message file")?;
    let stripped = message::strip_comments(&raw, comment_char(vcs));
    let parsed = message::parse(&stripped);

    if parsed.title.trim().is_empty() {
        bail!("commit title is empty");
    }
    if parsed.uuid().is_none() {
        bail!("commit message is missing the PR-UUID trailer (run `{} install` to restore hooks)", program_name());
    }
    if parsed.stack_name().is_none() {
        bail!("commit message is missing the PR-Stack trailer (run `{} install` to restore hooks)", program_name());
    }

    Ok(())
}

/// `post-commit`: classify the new HEAD commit and run the mutation
/// cascade. Silent no-op if the VCS is mid-rebase (hooks fire during each
/// replayed commit otherwise) or the branch isn't a stack branch.
pub fn post_commit(vcs: &Vcs) -> Result<()> {
    if vcs.rebase_in_progress()? {
        return Ok(());
    }

    let ctx = match StackContext::build(vcs) {
        Ok(ctx) => ctx,
        Err(e) if e.downcast_ref::<StackError>().is_some_and(|e| matches!(e, StackError::NotAStackBranch { .. })) => {
            return Ok(())
        }
        Err(e) => return Err(e),
    };

    let Some(kind) = mutate::classify(vcs, &ctx)? else {
        return Ok(());
    };

    mutate::apply(vcs, &ctx, kind)?;
    Ok(())
}
