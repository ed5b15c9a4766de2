//! `fixup`: fold staged changes into an earlier change via autosquash.

use anyhow::Result;

use crate::mutate;
use crate::navigation::Position;
use crate::stack_context::StackContext;
use crate::ui;
use crate::vcs::Vcs;

pub fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;

    if ctx.position() != Position::OnTop {
        anyhow::bail!("fixup must be run from the top of the stack");
    }

    let candidates: Vec<_> = ctx.active_changes.iter().filter(|c| !c.is_merged()).collect();
    if candidates.is_empty() {
        anyhow::bail!("no active changes to fixup into");
    }

    let labels: Vec<String> = candidates.iter().map(|c| format!("#{} {}", c.active_position.unwrap_or(0), c.title)).collect();
    let index = ui::select("fold the staged changes into which change?", &labels)?;
    let target = candidates[index].uuid.clone();

    let rebuilt = mutate::fixup(&vcs, &ctx, &target)?;
    ui::success(&format!("folded into '{}'", rebuilt.find(&target).map(|c| c.title.as_str()).unwrap_or("?")));
    Ok(())
}
