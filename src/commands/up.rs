//! `up`: move one change toward the stack's tip.

use anyhow::Result;

use crate::navigation;
use crate::stack_context::StackContext;
use crate::vcs::Vcs;

pub fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;
    navigation::go_up(&vcs, &ctx)
}
