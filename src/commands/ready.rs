//! `ready [--all]`: mark a change (or every active change) ready for review.

use anyhow::Result;

use crate::stack_context::StackContext;
use crate::vcs::Vcs;

use super::mark_draft_state;

pub fn run(all: bool) -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;
    mark_draft_state(&ctx, all, false)
}
