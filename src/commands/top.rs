//! `top`: check out the stack's TOP branch.

use anyhow::Result;

use crate::navigation;
use crate::stack_context::StackContext;
use crate::vcs::Vcs;

pub fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;
    navigation::go_top(&vcs, &ctx)
}
